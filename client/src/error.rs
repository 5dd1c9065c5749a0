use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid session cookie: {0}")]
    InvalidSessionCookie(String),
}

impl ClientError {
    /// The server's own message when it sent one, otherwise the error text.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let err = ClientError::Http {
            status: 400,
            message: "Token expired".into(),
        };
        assert_eq!(err.user_message(), "Token expired");
        assert!(!err.is_unauthorized());

        let err = ClientError::Transport("connection refused".into());
        assert_eq!(err.user_message(), "request failed: connection refused");
        assert_eq!(err.status(), None);
    }
}
