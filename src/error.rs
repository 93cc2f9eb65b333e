// Error types for document mapping

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ValueType;

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

/// Errors that can occur while decoding values or binding members
#[derive(Error, Debug)]
pub enum MappingError {
    /// Text cannot be coerced to the declared type
    #[error("Cannot convert '{value}' to {target_type}: {reason}")]
    Conversion {
        /// Offending text
        value: String,
        /// Declared target type
        target_type: ValueType,
        /// Underlying parse failure
        reason: String,
    },

    /// A class reference could not be resolved through the active context
    #[error("Cannot load class {name}")]
    ClassResolution {
        /// Requested class name
        name: String,
        /// Loader failure
        #[source]
        source: ClassNotFound,
    },

    /// An accessor write failed for a reason unrelated to application logic
    #[error("Invalid binding {accessor}: {message}")]
    InvalidBinding {
        /// Accessor signature
        accessor: String,
        /// What went wrong
        message: String,
    },

    /// Error raised by application code invoked from a setter
    #[error(transparent)]
    Application(#[from] anyhow::Error),

    /// Malformed XML input
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Document could not be read
    #[error("Cannot read {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Location pattern could not be parsed
    #[error("Invalid location pattern '{pattern}': {message}")]
    InvalidPath {
        /// Pattern as written
        pattern: String,
        /// What is wrong with it
        message: String,
    },

    /// Mapper configuration could not be parsed
    #[error("Invalid mapper configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl MappingError {
    /// Build a conversion error for `value` and `target_type`
    pub fn conversion(
        value: impl Into<String>,
        target_type: ValueType,
        reason: impl ToString,
    ) -> Self {
        MappingError::Conversion {
            value: value.into(),
            target_type,
            reason: reason.to_string(),
        }
    }

    /// Build an invalid binding error for the accessor printed as `accessor`
    pub fn invalid_binding(accessor: impl ToString, message: impl Into<String>) -> Self {
        MappingError::InvalidBinding {
            accessor: accessor.to_string(),
            message: message.into(),
        }
    }

    /// Surface an error returned by a setter
    ///
    /// Mapping errors raised inside application code come back unchanged;
    /// anything else is reported as [`MappingError::Application`].
    pub fn from_application(error: anyhow::Error) -> Self {
        match error.downcast::<MappingError>() {
            Ok(mapping) => mapping,
            Err(other) => MappingError::Application(other),
        }
    }

    /// Check if this is a conversion failure
    pub fn is_conversion(&self) -> bool {
        matches!(self, MappingError::Conversion { .. })
    }
}

/// A class loader could not find the requested class
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("class {name} not found in {loader}")]
pub struct ClassNotFound {
    /// Requested class name
    pub name: String,
    /// Name of the loader that was asked
    pub loader: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_application_errors_are_unwrapped() {
        let inner = MappingError::conversion("x", ValueType::Integer, "invalid digit");
        let surfaced = MappingError::from_application(anyhow::Error::new(inner));
        assert!(surfaced.is_conversion());

        let surfaced = MappingError::from_application(anyhow::anyhow!("service refused"));
        assert!(matches!(surfaced, MappingError::Application(_)));
        assert_eq!(surfaced.to_string(), "service refused");
    }

    #[test]
    fn test_class_resolution_source() {
        let err = MappingError::ClassResolution {
            name: "org.example.Missing".into(),
            source: ClassNotFound {
                name: "org.example.Missing".into(),
                loader: "bundle".into(),
            },
        };
        assert_eq!(err.to_string(), "Cannot load class org.example.Missing");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("class org.example.Missing not found in bundle".to_string())
        );
    }
}
