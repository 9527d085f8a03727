use anyhow::Result;
use animplot::cli::Cli;
use clap::Parser;
use tracing::Level;

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    // Run the main application logic from the library
    if let Err(e) = animplot::run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
