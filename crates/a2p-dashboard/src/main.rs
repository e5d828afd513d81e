mod bootstrap_helpers;
mod credentials;
mod dashboard_command;
mod terminal_sink;

use a2p_cli::Cli;
use anyhow::Result;
use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::dashboard_command::run_dashboard;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    run_dashboard(&cli)
}
