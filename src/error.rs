use thiserror::Error;

/// Process exit codes surfaced by every command.
pub mod exit {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const MISSING_CREDENTIAL: i32 = 2;
    /// Conventional "command not found" status.
    pub const TOOL_NOT_FOUND: i32 = 127;
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{var} not set")]
    MissingCredential { var: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({platform}): {message}")]
    Api {
        platform: String,
        message: String,
        status_code: Option<u16>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Rate limited by {platform}")]
    RateLimit {
        platform: String,
        retry_after_secs: Option<u64>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{binary} not found or could not be started: {source}")]
    ToolNotFound {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential { var: var.into() }
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    pub fn api(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            platform: platform.into(),
            message: message.into(),
            status_code: None,
        }
    }

    pub fn api_with_status(
        platform: impl Into<String>,
        message: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self::Api {
            platform: platform.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn tool_not_found(binary: impl Into<String>, source: std::io::Error) -> Self {
        Self::ToolNotFound {
            binary: binary.into(),
            source,
        }
    }

    /// Exit status a command reports when it fails with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredential { .. } => exit::MISSING_CREDENTIAL,
            Self::ToolNotFound { .. } => exit::TOOL_NOT_FOUND,
            _ => exit::FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
