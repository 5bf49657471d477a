use clap::Parser;

use vx3::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    vx3::logging::init_tracing();

    if let Err(e) = cli::run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
