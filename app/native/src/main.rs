//! Dailywall binary.
//!
//! One executable serves both the long-running daemon (`dailywall run`) and
//! the one-shot commands that act on the persisted state.

use clap::Parser;
use dailywall_lib::cli::Cli;
use dailywall_lib::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = cli.execute() {
        eprintln!("dailywall: {err}");
        std::process::exit(1);
    }
}
