use anyhow::{Context, Result};

use logfacade::config::Config;
use logfacade::{logging, sender};

fn main() -> Result<()> {
    // Configuration is fixed before the first record is logged
    let (config, source) = Config::load()?;
    let repository = config.build_repository()?;

    // Route tracing events from library code into the same sinks
    logging::install(&repository).context("Failed to install tracing bridge")?;

    // TRACE keeps the default output to the program's own six lines
    tracing::trace!(target: "logfacade::config", "Logging configured from {}", source);

    sender::run(&repository);
    Ok(())
}
