// src/main.rs

use ytdlp_runner::errors::RunnerError;
use ytdlp_runner::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        match err.downcast_ref::<RunnerError>() {
            Some(RunnerError::Interrupted) | Some(RunnerError::Cancelled(_)) => {
                eprintln!("ytdlp-runner: {err}");
                std::process::exit(130);
            }
            _ => {
                eprintln!("ytdlp-runner error: {err:?}");
                std::process::exit(1);
            }
        }
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
