use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain country statistics from the data source
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The body was not a JSON array of country records
    #[error("malformed payload: {0}")]
    Decode(#[from] simd_json::Error),

    /// The background fetch ended without reporting back
    #[error("fetch worker exited without a result")]
    WorkerLost,
}

/// Failure to load the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
