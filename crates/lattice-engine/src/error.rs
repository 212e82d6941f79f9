//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of a run so `main` can
//! propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lattice_core::ConfigError,
    },

    /// The grid could not be built from configuration.
    #[error("factory error: {source}")]
    Factory {
        /// The underlying factory error.
        #[from]
        source: lattice_core::FactoryError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: lattice_core::RunnerError,
    },

    /// The final snapshot could not be encoded.
    #[error("snapshot encoding failed: {source}")]
    Snapshot {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Writing output failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
