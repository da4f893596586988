use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use spool_web::encoding::GzipMiddleware;
use spool_web::{Server, endpoint};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "spool-server")]
#[command(about = "Serves echo, user-agent and file routes over HTTP/1.1", long_about = None)]
struct Cli {
    /// The address and port to listen on, e.g. localhost:4221
    address: String,

    /// Directory to serve
    #[arg(long, default_value = ".")]
    directory: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    info!(address = %cli.address, directory = %cli.directory.display(), "starting server");

    let server = match Server::builder()
        .address(cli.address)
        .router(endpoint::router(cli.directory))
        .wrap(GzipMiddleware::new())
        .build()
    {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server configuration");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(cause = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    match server.start_until(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "could not start server");
            ExitCode::FAILURE
        }
    }
}
