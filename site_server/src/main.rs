// course_site/site_server/src/main.rs

use std::net::SocketAddr;

use clap::Parser;
use site_server::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use workbench_core::WorkbenchConfig;

#[derive(Debug, Parser)]
#[command(version, about = "Course site: link lookup API and RSA workbench")]
struct Arguments {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Arguments::parse();
    let listener = TcpListener::bind(args.listen).await?;
    let state = AppState::new(WorkbenchConfig::default());

    site_server::serve(listener, state, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, shutting down");
        }
    })
    .await?;
    Ok(())
}
