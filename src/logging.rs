use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// `-v` count to log filter: 0 info, 1 debug, 2 trace for this tool, 3 trace for
/// the HTTP stack as well.
pub fn filter_for(verbosity: u8) -> Targets {
    let (own, dependencies) = match verbosity {
        0 => (LevelFilter::INFO, LevelFilter::INFO),
        1 => (LevelFilter::DEBUG, LevelFilter::INFO),
        2 => (LevelFilter::TRACE, LevelFilter::INFO),
        _ => (LevelFilter::TRACE, LevelFilter::TRACE),
    };

    Targets::new()
        .with_default(dependencies)
        .with_target(CRATE_TARGET, own)
}

/// Installs the stderr subscriber. `log` records are forwarded to it.
pub fn init(verbosity: u8) {
    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter_for(verbosity))
        .try_init();

    if let Err(err) = installed {
        eprintln!("Failed to install logger: {err}");
    }
}
