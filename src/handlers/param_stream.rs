use tracing::trace;

use crate::protocol::{ParamId, param_metadata};

/// Control byte declaring the default value length for following parameters.
pub(crate) const SET_SIZE: u8 = 0xFE;
/// Control byte declaring the page high byte for following parameter ids.
pub(crate) const SET_PAGE: u8 = 0xFF;
/// Control byte announcing an unsupported parameter; its argument is skipped.
pub(crate) const SKIP: u8 = 0xFD;
/// Control byte terminating the current function block.
pub(crate) const END_OF_BLOCK: u8 = 0xFC;

// Write blocks always declare this size; controllers resolve the actual value
// length from their own registry, so the declared size only applies to ids
// they do not know.
const WRITE_BLOCK_DECLARED_SIZE: u8 = 0x03;

/// One `(function id, parameter id, raw value)` record from a reply payload.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParamRecord {
    function_id: u8,
    param: ParamId,
    value: Vec<u8>,
}

impl ParamRecord {
    /// Returns the function id scoping this record's block.
    #[must_use]
    pub fn function_id(&self) -> u8 {
        self.function_id
    }

    /// Returns the full 16-bit parameter id.
    #[must_use]
    pub fn param(&self) -> ParamId {
        self.param
    }

    /// Returns the raw value bytes, zero-padded to the expected length.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// Single-pass scanner over a reply payload.
///
/// The payload is a sequence of function blocks separated by [`END_OF_BLOCK`]
/// markers. The first byte of each block is its function id; page and
/// default-size declarations reset at every block boundary. Values truncated
/// by the end of the datagram are zero-padded rather than rejected.
///
/// ```
/// use vento::{ParamId, ParamStream};
///
/// let records: Vec<_> = ParamStream::new(&[0x01, 0x02, 0x01, 0xFC]).collect();
/// assert_eq!(1, records.len());
/// assert_eq!(1, records[0].function_id());
/// assert_eq!(ParamId::new(0x0002), records[0].param());
/// assert_eq!(&[0x01], records[0].value());
/// ```
#[derive(Debug)]
pub struct ParamStream<'a> {
    bytes: &'a [u8],
    index: usize,
    function_id: Option<u8>,
    page: u8,
    default_len: usize,
}

impl<'a> ParamStream<'a> {
    /// Creates a scanner over one decoded payload.
    #[must_use]
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            bytes: payload,
            index: 0,
            function_id: None,
            page: 0x00,
            default_len: 1,
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.index).copied();
        if byte.is_some() {
            self.index += 1;
        }
        byte
    }
}

impl Iterator for ParamStream<'_> {
    type Item = ParamRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let byte = self.next_byte()?;

            let Some(function_id) = self.function_id else {
                trace!(function_id = byte, "entering function block");
                self.function_id = Some(byte);
                continue;
            };

            match byte {
                SET_SIZE => {
                    self.default_len = self.next_byte().map_or(1, usize::from);
                }
                SET_PAGE => {
                    self.page = self.next_byte().unwrap_or(0x00);
                }
                SKIP => {
                    let _ = self.next_byte();
                }
                END_OF_BLOCK => {
                    trace!(function_id, "end of function block");
                    self.function_id = None;
                    self.page = 0x00;
                    self.default_len = 1;
                }
                low => {
                    let param = ParamId::from_page(self.page, low);
                    let length = param_metadata(param)
                        .map_or(self.default_len, |metadata| metadata.length());

                    let mut value = vec![0u8; length];
                    let available = length.min(self.bytes.len() - self.index);
                    value[..available]
                        .copy_from_slice(&self.bytes[self.index..self.index + available]);
                    self.index += available;

                    return Some(ParamRecord {
                        function_id,
                        param,
                        value,
                    });
                }
            }
        }
    }
}

/// Encodes one write block: `FE, declared size, parameter low byte, value`.
///
/// Every writable parameter in the current set has an id of at most 255, so
/// no page declaration is ever emitted on the write path.
pub(crate) fn write_block(param: ParamId, value: &[u8]) -> Vec<u8> {
    debug_assert!(param.value() <= 0xFF, "write path has no page support");

    let mut block = Vec::with_capacity(3 + value.len());
    block.push(SET_SIZE);
    block.push(WRITE_BLOCK_DECLARED_SIZE);
    block.push(param.low_byte());
    block.extend_from_slice(value);
    block
}

/// Encodes a batched read request: each parameter id as 16 bits little-endian.
pub(crate) fn read_request_payload(params: &[ParamId]) -> Vec<u8> {
    params
        .iter()
        .flat_map(|param| param.value().to_le_bytes())
        .collect()
}
