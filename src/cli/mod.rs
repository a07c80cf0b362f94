//! Command-line front end
//!
//! `run` wires a data source and resolver from the parsed flags; `execute`
//! does the actual check against any resolver and writes the report.

mod args;
mod console;

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::output::{print_risks, print_risks_json, printer_for, OutputFormat};
use crate::permissions::Resolver;
use crate::risk::classify;
use crate::source::{KubectlSource, RbacSource, SnapshotSource};

pub use args::Cli;
pub use console::Console;

/// Run one check or risk report for the parsed command line
pub async fn run(cli: &Cli, console: &Console, cancel: CancellationToken) -> Result<()> {
    let source: Arc<dyn RbacSource> = match &cli.snapshot {
        Some(path) => {
            let snapshot = SnapshotSource::load(path)
                .with_context(|| format!("failed to load snapshot {}", path.display()))?;
            let captured = match snapshot.captured_at() {
                Some(at) => format!(" (captured {})", at.format("%Y-%m-%d %H:%M:%S UTC")),
                None => String::new(),
            };
            console.print_note(&format!("Using RBAC snapshot {}{}", path.display(), captured));
            Arc::new(snapshot)
        }
        None => Arc::new(KubectlSource::new(cli.kubectl_config())),
    };

    tracing::info!("Resolving against {} source", source.source_name());

    let resolver = Resolver::with_config(source, cli.resolver_config()).with_cancellation(cancel);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli, &resolver, console, &mut out).await
}

/// Resolve what the command line asks for and print the report
pub async fn execute<S: RbacSource>(
    cli: &Cli,
    resolver: &Resolver<S>,
    console: &Console,
    out: &mut dyn Write,
) -> Result<()> {
    let subject = cli.subject()?;

    if cli.show_risky {
        let grants = resolver
            .resolve_all_permissions(&subject, cli.namespace())
            .await
            .context("failed to enumerate permissions")?;
        let risks = classify(&grants);

        match cli.output {
            OutputFormat::Json => print_risks_json(out, &subject, cli.namespace(), &risks)?,
            OutputFormat::Text => print_risks(out, &risks)?,
            other => {
                console.print_warning(&format!(
                    "risk reports have no {} form, printing text",
                    other
                ));
                print_risks(out, &risks)?;
            }
        }
        return Ok(());
    }

    let request = cli.permission_request()?;
    let result = resolver
        .resolve_permission(&subject, &request)
        .await
        .context("failed to resolve permission")?;

    if !result.is_complete() && cli.output != OutputFormat::Text {
        for error in &result.errors {
            console.print_warning(&error.to_string());
        }
    }

    let color = !cli.no_color && cli.output == OutputFormat::Text;
    printer_for(cli.output, color).print(out, &result)?;
    out.flush()?;
    Ok(())
}
