//! Program logging.
//!
//! Warnings and errors go to stderr and everything else to stdout, coloured when the stream is a
//! terminal. A simulation run also keeps a plain-text `bstock.log` in its output folder, so the
//! record of how each vintage was opened and closed sits next to the results.
use anyhow::{Context, Result, ensure};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Log level used when neither the environment nor the settings file choose one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which takes precedence over the `log_level` setting
const LOG_LEVEL_ENV_VAR: &str = "BSTOCK_LOG_LEVEL";

/// Name of the log file written to the output folder of a run
const LOG_FILE_NAME: &str = "bstock.log";

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Whether [`init`] has already succeeded
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Pick the log level from the environment variable, then the settings file, then the default.
///
/// Level names are those accepted by [`LevelFilter`] (`off`, `error`, `warn`, `info`, `debug`,
/// `trace`), in any case.
fn resolve_level(from_env: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    let name = from_env.or(from_settings).unwrap_or(DEFAULT_LOG_LEVEL);
    LevelFilter::from_str(name).ok().with_context(|| format!("Unknown log level: {name}"))
}

/// The part of a record's target worth printing: `bstock::ledger` becomes `ledger`
fn short_target(target: &str) -> &str {
    target.strip_prefix("bstock::").unwrap_or(target)
}

fn format_line<L: Display>(out: FormatCallback, level: L, record: &Record, message: &Arguments) {
    out.finish(format_args!(
        "[{} {level} {}] {message}",
        Local::now().format("%H:%M:%S"),
        short_target(record.target())
    ));
}

/// A console dispatcher, colouring the level only if `stream_is_terminal`
fn console(stream_is_terminal: bool) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    Dispatch::new().format(move |out, message, record| {
        if stream_is_terminal {
            format_line(out, colours.color(record.level()), record, message);
        } else {
            format_line(out, record.level(), record, message);
        }
    })
}

/// Set up the global logger.
///
/// # Arguments
///
/// * `log_level_from_settings` - The `log_level` from `settings.toml`, if any
/// * `output_path` - Output folder of a simulation run. If given, `bstock.log` is written there
///   with every message at `info` or above (or at the chosen level, if lower).
pub fn init(log_level_from_settings: Option<&str>, output_path: Option<&Path>) -> Result<()> {
    let from_env = env::var(LOG_LEVEL_ENV_VAR).ok();
    let level = resolve_level(from_env.as_deref(), log_level_from_settings)?;
    ensure!(!is_logger_initialised(), "Logger already initialised");

    let mut dispatch = Dispatch::new()
        .chain(
            console(std::io::stdout().is_terminal())
                .level(level)
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .chain(std::io::stdout()),
        )
        .chain(
            console(std::io::stderr().is_terminal())
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(output_path) = output_path {
        let file_path = output_path.join(LOG_FILE_NAME);
        let file = File::create(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))?;
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(|out, message, record| format_line(out, record.level(), record, message))
                .level(level.max(LevelFilter::Info))
                .chain(file),
        );
    }

    dispatch.apply()?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, LevelFilter::Info)]
    #[case(None, Some("debug"), LevelFilter::Debug)]
    #[case(Some("off"), Some("debug"), LevelFilter::Off)]
    #[case(Some("WARN"), None, LevelFilter::Warn)]
    fn test_resolve_level(
        #[case] from_env: Option<&str>,
        #[case] from_settings: Option<&str>,
        #[case] expected: LevelFilter,
    ) {
        assert_eq!(resolve_level(from_env, from_settings).unwrap(), expected);
    }

    #[test]
    fn test_resolve_level_unknown() {
        assert_error!(resolve_level(None, Some("loud")), "Unknown log level: loud");
    }

    #[test]
    fn test_short_target() {
        assert_eq!(short_target("bstock::ledger"), "ledger");
        assert_eq!(short_target("bstock::model::parameters"), "model::parameters");
        assert_eq!(short_target("other_crate"), "other_crate");
    }
}
