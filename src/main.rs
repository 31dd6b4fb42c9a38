use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;

use vento::{Args, OutputFormat, run, transport_from_selection};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let mut stdout = std::io::stdout();

    let run_result = async {
        let log_level = args.log_level();
        let output_format = args.output_format().unwrap_or(if stdout.is_terminal() {
            OutputFormat::Pretty
        } else {
            OutputFormat::Json
        });
        let (command, session_config, selection) = args.into_parts()?;
        let transport = transport_from_selection(selection);

        run(
            command,
            &mut stdout,
            session_config,
            transport,
            log_level,
            output_format,
        )
        .await
    }
    .await;

    match run_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
