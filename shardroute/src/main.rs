use std::process::exit;

use clap::Parser;
use tracing::error;

use shardroute::cli::{self, Cli};
use shardroute::logger;

fn main() {
    let cli = Cli::parse();
    logger(cli.log_format);

    if let Err(err) = cli::run(cli) {
        error!("{}", err);
        exit(1);
    }
}
