use crate::config::Config;
use crate::store::data_dir;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

const LOG_FILE_NAME: &str = "dayplan.log";

/// Sends `log` output to a file in the data directory; the terminal belongs to the UI.
pub fn init(config: &Config) -> Result<()> {
    let dir = data_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {:?}", path))?;
    env_logger::Builder::new()
        .filter_level(config.level_filter())
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("installing logger")?;
    log::debug!("logging to {}", path.display());
    Ok(())
}
