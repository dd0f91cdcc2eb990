use thiserror::Error;

/// Engine-level errors surfaced to callers outside the enumeration pipeline.
///
/// Per-name failures (wildcard suppression, out-of-scope, duplicates,
/// transient resolver errors) never reach this type: the scheduler and
/// resolver pool swallow them internally and only emit `tracing`/event-bus
/// signals. Only the failures in §7 of the spec that are fatal to a run, or
/// that a caller must react to programmatically, are represented here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no resolvers available after sanity checks")]
    NoResolversAvailable,

    #[error("invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("graph write error: {0}")]
    GraphWriteError(String),

    #[error("data source error ({source}): {message}")]
    DataSourceError { source: String, message: String },

    #[error("event bus is closed")]
    PublishAfterClose,

    #[error("query timed out")]
    QueryTimeout,

    #[error("run cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(String),
}

/// Startup-time configuration failures. Fatal; the CLI maps these to exit
/// code 2 (see §7 and §6).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required option: {0}")]
    MissingOption(String),

    #[error("invalid value for option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("unrecognized option: {0}")]
    UnrecognizedOption(String),

    #[error("scope must name at least one root domain")]
    EmptyScope,

    #[error("unknown record type: {0}")]
    UnknownRecordType(String),

    #[error("include and exclude source filters are mutually exclusive")]
    ConflictingSourceFilter,

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("failed to parse config file {path}: {reason}")]
    ParseFailed { path: String, reason: String },
}
