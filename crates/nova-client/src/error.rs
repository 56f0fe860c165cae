use thiserror::Error;

/// Unified error type for transport operations
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no content received from the stream")]
    EmptyResponse,
}

impl ClientError {
    /// User-facing text for rendering the failure inside the chat.
    ///
    /// Status codes follow the completion API's documented meanings; anything
    /// unrecognized falls back to a generic line with the raw status.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Config(msg) => format!("Configuration error: {}.", msg),
            ClientError::Validation(msg) => format!("Cannot send message: {}.", msg),
            ClientError::Network(_) => {
                "Network error while contacting the model service. Check your connection.".to_string()
            }
            ClientError::Api { status, .. } => match status {
                400 => "The request was malformed and rejected by the server.".to_string(),
                401 => "Invalid or expired API key. Check your credentials in settings.".to_string(),
                403 => "Access denied. Your account may not be verified for this model.".to_string(),
                429 => "Rate limit reached. Wait a moment before sending again.".to_string(),
                500 => "The model service reported an internal error.".to_string(),
                503 | 504 => "The model service is temporarily unavailable. Try again later.".to_string(),
                other => format!("Request failed with status {}.", other),
            },
            ClientError::Parse(_) => "The server sent a response that could not be read.".to_string(),
            ClientError::EmptyResponse => "No content was received from the model.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unauthorized = ClientError::Api {
            status: 401,
            message: String::new(),
        };
        assert!(unauthorized.user_message().contains("Invalid or expired API key"));

        let rate_limited = ClientError::Api {
            status: 429,
            message: String::new(),
        };
        assert!(rate_limited.user_message().contains("Rate limit"));

        let unavailable = ClientError::Api {
            status: 503,
            message: String::new(),
        };
        assert!(unavailable.user_message().contains("temporarily unavailable"));

        let teapot = ClientError::Api {
            status: 418,
            message: String::new(),
        };
        assert!(teapot.user_message().contains("418"));
    }
}
