//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("Duplicate {kind} registration: {name}")]
    DuplicateRegistration { kind: &'static str, name: String },

    #[error("Unknown entity type: {0}")]
    UnknownType(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("State misuse: {0}")]
    StateMisuse(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

impl EmberError {
    /// Shorthand for hook failures raised by entities, systems and listeners
    pub fn runtime(msg: impl Into<String>) -> Self {
        EmberError::Runtime(msg.into())
    }
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for EmberError {
    fn from(err: toml::ser::Error) -> Self {
        EmberError::TomlSerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_message() {
        let err = EmberError::DuplicateRegistration {
            kind: "system",
            name: "physics".into(),
        };
        assert_eq!(err.to_string(), "Duplicate system registration: physics");
    }

    #[test]
    fn toml_errors_convert() {
        let parsed: std::result::Result<toml::Table, _> = toml::from_str("not = [valid");
        let err: EmberError = parsed.unwrap_err().into();
        assert!(matches!(err, EmberError::TomlParseError(_)));
    }
}
