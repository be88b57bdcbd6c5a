use std::fmt;

#[derive(Debug)]
pub enum CoreError {
    InvalidParameter(String),
    SerializationError(String),
    DeserializationError(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            CoreError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            CoreError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CoreError::DeserializationError(err.to_string())
        } else {
            CoreError::SerializationError(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CoreError::InvalidParameter("lineup_size must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: lineup_size must be positive");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::DeserializationError(_)));
    }
}
