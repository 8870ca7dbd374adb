use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use salesreport::config::{self, Settings};
use salesreport::{api, pipeline};

#[derive(Parser)]
#[command(name = "salesreport", about = "Sales CSV analysis and PDF reporting")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the batch pipeline and write the PDF report (default).
    Run {
        /// Input CSV, defaults to `<data_dir>/ventes_2025.csv`.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Serve the HTTP API.
    Serve,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_logging(&cli.settings)?;

    match cli.command.unwrap_or(Command::Run { csv: None }) {
        Command::Run { csv } => {
            let pdf_path = pipeline::run(&cli.settings, csv.as_deref())?;
            println!("{}", pdf_path.display());
        },
        Command::Serve => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(api::serve(cli.settings))?;
        },
    }

    Ok(())
}
