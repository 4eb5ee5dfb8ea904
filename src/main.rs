use antigravity_quota::{modules::logger, run, OutputFormat};
use clap::Parser;

/// Query Antigravity model quota status
#[derive(Debug, Parser)]
#[command(name = "antigravity-quota", version)]
struct Cli {
    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Output the raw API response
    #[arg(long)]
    raw: bool,

    /// Show progress messages
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    let format = if cli.raw {
        OutputFormat::Raw
    } else if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    if let Err(e) = run(format).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
