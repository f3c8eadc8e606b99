//! cl - Chains of dependent changelists reviewed on Gerrit

use clchain::cli::{self, Cli};
use clchain::ui::output;

fn main() {
    let cli = Cli::parse_args();

    let directives = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(cli::log_filter(cli.debug, directives.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(cli) {
        output::error(format!("{e:#}"));
        std::process::exit(1);
    }
}
