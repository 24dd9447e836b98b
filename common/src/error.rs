use thiserror::Error;

pub type Result<T> = std::result::Result<T, TsdbError>;

/// Errors surfaced by the tsdb cluster crates
#[derive(Error, Debug)]
pub enum TsdbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl TsdbError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TsdbError::configuration("missing this_node");
        assert_eq!(err.to_string(), "Configuration error: missing this_node");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "cluster.toml");
        let err: TsdbError = io.into();
        assert!(matches!(err, TsdbError::Io(_)));
    }
}
