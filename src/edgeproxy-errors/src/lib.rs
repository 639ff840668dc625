use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Every failure the provisioning engine can report.
///
/// Variants carry the context a caller needs to branch on (endpoint, status,
/// offending entry) instead of a pre-formatted message.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Malformed `name.scheme://host:port` entry or URL.
    #[error("invalid route entry `{entry}`: {reason}")]
    Parse { entry: String, reason: String },

    /// 409 on a call where a conflict is not acceptable.
    #[error("object already exists at {endpoint}")]
    AlreadyExists { endpoint: String },

    /// Unexpected status from the gateway or the secret store.
    #[error("request to {endpoint} failed with status {status}: {body}")]
    Gateway {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A DELETE the gateway refused.
    #[error("failed to delete {id} from {collection} at {endpoint} with status {status}: {body}")]
    Delete {
        endpoint: String,
        collection: String,
        id: String,
        status: u16,
        body: String,
    },

    /// Missing or empty bootstrap/access token.
    #[error("authentication material unavailable: {0}")]
    Auth(String),

    /// The gateway already holds a certificate for the submitted pair.
    #[error("certificate already uploaded: {body}")]
    CertUploadConflict { body: String },

    /// Connection level failure, never retried here.
    #[error("failed to reach {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to decode {context}: {message}")]
    Decode { context: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("empty certificate pair")]
    EmptyCertPair,
}

impl ProxyError {
    pub fn parse(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub fn gateway(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Gateway {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    pub fn transport(endpoint: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: err.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// True for the "object is already there" family, which create-style
    /// callers treat as success.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::CertUploadConflict { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Gateway { status, .. } | Self::Delete { status, .. } => Some(*status),
            Self::AlreadyExists { .. } | Self::CertUploadConflict { .. } => Some(409),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(e: serde_json::Error) -> Self {
        Self::decode("json payload", e)
    }
}
