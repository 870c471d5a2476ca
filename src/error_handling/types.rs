use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    NotInRange(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlError(err.to_string())
    }
}

#[derive(Debug)]
pub enum StorageError {
    ConnectionFailed(String),
    WriteFailed(String),
    ReadFailed(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed(e) => write!(f, "Storage connection failed: {}", e),
            StorageError::WriteFailed(e) => write!(f, "Storage write failed: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Storage read failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

/// Rejection of caller-supplied data, reported back as a 400.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingField(String),
    EmptyField(String),
    InvalidValue { field: String, value: String },
    UnknownField(String),
    Malformed(String),
}

impl ValidationError {
    pub fn invalid(field: &str, value: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(name) => write!(f, "`{}` is required", name),
            ValidationError::EmptyField(name) => write!(f, "`{}` must not be empty", name),
            ValidationError::InvalidValue { field, value } => {
                write!(f, "`{}` is not a valid value for `{}`", value, field)
            }
            ValidationError::UnknownField(name) => write!(f, "`{}` cannot be set", name),
            ValidationError::Malformed(e) => write!(f, "Malformed request: {}", e),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum ServiceError {
    NotFound,
    Validation(ValidationError),
    Storage(StorageError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound => write!(f, "Interface not found"),
            ServiceError::Validation(e) => write!(f, "Validation error: {}", e),
            ServiceError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err)
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Unable to bind web server: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::MissingField("message".into()).to_string(),
            "`message` is required"
        );
        assert_eq!(
            ValidationError::invalid("status", "DONE").to_string(),
            "`DONE` is not a valid value for `status`"
        );
    }

    #[test]
    fn test_service_error_from_storage() {
        let err: ServiceError = StorageError::ReadFailed("disk".into()).into();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: Storage read failed: disk");
    }
}
