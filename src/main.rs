use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use rbac_why::cli::{self, Cli, Console};
use rbac_why::logging;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let color = !cli.no_color && std::io::stdout().is_terminal();
    colored::control::set_override(color);
    let console = Console::new().with_color(color);

    // Held until exit so buffered file logs are flushed
    let _log_guard = match logging::init_logging(&cli.logging_config()) {
        Ok(guard) => guard,
        Err(e) => {
            console.print_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!("Parsed command line: {:?}", cli);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling resolution");
            on_interrupt.cancel();
        }
    });

    match cli::run(&cli, &console, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            console.print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
