use surveyor_domain::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// CLI-flag overrides for logging, layered the same way as `CliOverrides`
/// for the rest of the config (`-log`, `-json`, `-nocolor`, `-silent`,
/// repeated `-v`).
pub struct LoggingOverrides {
    pub level: Option<String>,
    pub json: bool,
    pub no_color: bool,
    pub silent: bool,
    pub verbosity: u8,
}

/// Initializes the global `tracing` subscriber (§7.1 "ambient" logging
/// stack), grounded on the teacher's `init_logging`.
pub fn init_logging(config: &LoggingConfig, overrides: &LoggingOverrides) {
    if overrides.silent || config.silent {
        return;
    }

    let level = overrides
        .level
        .clone()
        .unwrap_or_else(|| config.level.clone());
    let level = match overrides.verbosity {
        0 => level,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = overrides.json || config.json;
    let ansi = !overrides.no_color && config.ansi;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(ansi);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
