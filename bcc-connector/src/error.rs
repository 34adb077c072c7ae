//! Error types for the connector

use thiserror::Error;

/// Result type for connector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Longest slice of a response body kept inside an error
const BODY_EXCERPT_LEN: usize = 512;

/// Errors surfaced by the connector
#[derive(Error, Debug)]
pub enum Error {
    /// The service answered with an HTTP status >= 400
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The request never produced a response (connection, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A JSON body was expected but could not be parsed
    #[error("Malformed response: {body_excerpt}")]
    MalformedResponse { body_excerpt: String },

    /// The memory base metadata names no reference (order) variable
    #[error("Memory base {memory_base} has no order variable")]
    MissingOrderVariable { memory_base: String },

    /// More than one authentication method in the configuration
    #[error("Authentication should use only one method")]
    AmbiguousAuthentication,

    /// No authentication method in the configuration
    #[error("The configuration needs an oauth2_token or an api_key")]
    MissingAuthentication,

    /// No configuration source could be located
    #[error("The client needs a configuration file")]
    ConfigurationNotFound,

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A raw entity object lacks the configured id or name key
    #[error("Missing field '{field}' in {entity} metadata")]
    MissingField { entity: &'static str, field: String },

    /// Parameter store rejected a value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The cube is not in the list of accessible cubes
    #[error("Unknown braincube: {0}")]
    UnknownCube(String),

    /// The parent entity was dropped before a child needed it
    #[error("Parent entity is no longer available")]
    ParentDropped,

    /// A client is already held by this slot
    #[error("A client has already been initialized")]
    SessionAlreadyActive,

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `MalformedResponse` keeping at most a short prefix of the body
    pub fn malformed(body: &str) -> Self {
        let body_excerpt = match body.char_indices().nth(BODY_EXCERPT_LEN) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        Error::MalformedResponse { body_excerpt }
    }
}
