use std::fmt;

/// 錯誤種類（不含內部細節）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedEngine,
    TransportFailure,
    TokenNotFound,
    DiscoveryFailed,
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::UnsupportedEngine => "unsupported engine",
            ErrorKind::TransportFailure => "transport failure",
            ErrorKind::TokenNotFound => "token not found",
            ErrorKind::DiscoveryFailed => "discovery failed",
            ErrorKind::MalformedResponse => "malformed response",
        };
        f.write_str(name)
    }
}

/// 搜尋引擎錯誤
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),

    #[error("request failed during {phase}: {source}")]
    Transport {
        phase: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("token not found: {0}")]
    TokenNotFound(String),

    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("malformed response during {phase}: {message}")]
    MalformedResponse {
        phase: &'static str,
        message: String,
    },
}

impl EngineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        EngineError::InvalidInput(message.into())
    }

    pub fn transport(phase: &'static str, source: reqwest::Error) -> Self {
        EngineError::Transport { phase, source }
    }

    pub fn malformed(phase: &'static str, message: impl Into<String>) -> Self {
        EngineError::MalformedResponse {
            phase,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidInput(_) => ErrorKind::InvalidInput,
            EngineError::UnsupportedEngine(_) => ErrorKind::UnsupportedEngine,
            EngineError::Transport { .. } => ErrorKind::TransportFailure,
            EngineError::TokenNotFound(_) => ErrorKind::TokenNotFound,
            EngineError::DiscoveryFailed(_) => ErrorKind::DiscoveryFailed,
            EngineError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            EngineError::invalid_input("x").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::malformed("parse", "missing header").kind(),
            ErrorKind::MalformedResponse
        );
        assert_eq!(
            EngineError::DiscoveryFailed("no frame".into()).kind(),
            ErrorKind::DiscoveryFailed
        );
    }

    #[test]
    fn test_message_carries_phase() {
        let err = EngineError::malformed("tineye search", "missing total_pages");
        assert_eq!(
            err.to_string(),
            "malformed response during tineye search: missing total_pages"
        );
    }
}
