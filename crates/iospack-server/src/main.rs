use clap::Parser;
use iospack_server::Store;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "iospack-server", about = "iospack artifact lookup service")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8322)]
    port: u16,

    /// Directory holding the artifact index.
    #[arg(long, default_value = "./iospack-artifacts")]
    data_dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let store = match Store::open(cli.data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("failed to open data directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let addr = format!("0.0.0.0:{}", cli.port);
    info!("starting iospack-server on {addr}");
    info!("data directory: {}", store.data_dir().display());

    match iospack_server::run_server(&store, &addr) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}
