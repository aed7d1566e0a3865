//! Terminal logging for the binary and for ad-hoc debugging of the library.
//!
//! The library itself only talks to the `log` facade: parser warnings go out
//! through `warn!`, table loading through `info!`/`debug!`. Nothing is printed
//! until a logger is installed here.

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Reads a level name such as `"warn"` or `"Debug"`. Unknown names fall back to `Warn`.
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Warn)
}

/// Installs a terminal logger at `level`. Only the first call has an effect.
pub fn init_logging(level: LevelFilter) {
    INIT.call_once(|| {
        let config = ConfigBuilder::new()
            .set_time_level(LevelFilter::Off)
            .set_target_level(LevelFilter::Debug)
            .build();
        // another logger may already be installed by the host application
        if TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto).is_err() {
            log::set_max_level(level);
        }
    });
}
