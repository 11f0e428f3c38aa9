use crate::analyze::{run_compare, run_qc, CompareArgs, QcArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use parametric::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Parametric QC",
    about = "Compare equipment parameter exports and score their quality",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compare parameter exports and print the classified results
    Compare(CompareArgs),
    /// Validate parameter exports and print the scorecard
    Qc(QcArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Compare(args) => run_compare(args),
        Command::Qc(args) => run_qc(args),
    }
}
