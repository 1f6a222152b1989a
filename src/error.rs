use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotboardError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized")]
    Unauthorized,
}

pub use crate::Result;

impl From<serde_json::Error> for BotboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for BotboardError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_category_and_detail() {
        let err = BotboardError::Config("x".to_string());
        assert!(format!("{err}").contains("configuration error"));

        let err = BotboardError::Validation("chatbot name is required".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: chatbot name is required"
        );
        assert_eq!(BotboardError::Unauthorized.to_string(), "unauthorized");
    }

    #[test]
    fn serde_errors_convert_to_serialization() {
        let err: BotboardError = serde_json::from_str::<serde_json::Value>("{bad}")
            .unwrap_err()
            .into();
        assert!(matches!(err, BotboardError::Serialization(_)));
    }
}
