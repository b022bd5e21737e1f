//! Console logging

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use thiserror::Error;

const CONSOLE_APPENDER: &str = "stdout";

pub const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)}Z [{h({({l}):5.5})}] {m}{n}";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Invalid logger configuration: {0}")]
    Config(String),

    #[error("Logger already installed: {0}")]
    SetLogger(#[from] log::SetLoggerError),
}

fn config(level: LevelFilter) -> Result<Config, LogError> {
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)))
        .build(Root::builder().appender(CONSOLE_APPENDER).build(level))
        .map_err(|e| LogError::Config(e.to_string()))
}

/// Install the global console logger
pub fn init_logger(level: LevelFilter) -> Result<(), LogError> {
    log4rs::init_config(config(level)?)?;
    Ok(())
}
