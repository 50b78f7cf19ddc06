mod cli;
mod download;
mod error;
mod logger;
mod resolver;

use colored::Colorize;
use download::progress::ProgressRenderer;
use resolver::YtDlp;
use std::backtrace::BacktraceStatus;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse_or_exit(std::env::args_os());
    logger::init(cli.verbose);

    let backend = Arc::new(YtDlp::new(
        cli.yt_dlp.clone(),
        cli.ffmpeg.clone(),
        cli.chunk_size,
    ));
    let renderer = Arc::new(ProgressRenderer::stdout());

    match cli.execute(backend, renderer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Prints the error kind, the message chain and, when captured, the backtrace.
fn report(e: &anyhow::Error) {
    println!();
    println!("{}", error::kind(e).bold().red());
    println!("{:#}", e);
    let backtrace = e.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        println!("{}", backtrace);
    }
}
