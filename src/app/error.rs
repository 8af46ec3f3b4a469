use thiserror::Error;

/// Mistakes made while configuring the server.  These are surfaced immediately to the host
/// rather than deferred to request time: a device that starts up with a broken resource table
/// should fail loudly during setup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("endpoint {0:?} is already registered")]
    DuplicateEndpoint(String),

    #[error("invalid endpoint name {0:?}: must be a single non-empty path segment")]
    InvalidName(String),

    #[error("no packet provider bound, call set_packet_provider before start")]
    NoTransport,

    #[error("endpoints cannot be created once the server is running")]
    RegistryFrozen,
}
