use edgeproxy_errors::{ProxyError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of local secret files, swappable in tests.
pub trait FileOpener: Send + Sync {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFileOpener;

impl FileOpener for DefaultFileOpener {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| ProxyError::io(path.display().to_string(), e))
    }
}

#[derive(Deserialize)]
struct TokenFile {
    auth: TokenAuth,
}

#[derive(Deserialize)]
struct TokenAuth {
    client_token: String,
}

/// Reads a bearer token from a file holding either the raw token or the
/// secret store JSON `{"auth":{"client_token":"..."}}`.
pub struct TokenLoader<'a> {
    opener: &'a dyn FileOpener,
}

impl<'a> TokenLoader<'a> {
    pub fn new(opener: &'a dyn FileOpener) -> Self {
        Self { opener }
    }

    pub fn load(&self, path: &Path) -> Result<String> {
        let shown = path.display();
        let raw = self
            .opener
            .read(path)
            .map_err(|e| ProxyError::Auth(format!("cannot read token file {shown}: {e}")))?;
        let text = String::from_utf8(raw)
            .map_err(|_| ProxyError::Auth(format!("token file {shown} is not utf-8")))?;
        let text = text.trim();

        let token = if text.starts_with('{') {
            let parsed: TokenFile = serde_json::from_str(text)
                .map_err(|e| ProxyError::Auth(format!("token file {shown}: {e}")))?;
            parsed.auth.client_token
        } else {
            text.to_string()
        };

        if token.trim().is_empty() {
            return Err(ProxyError::Auth(format!("token file {shown} holds an empty token")));
        }
        Ok(token.trim().to_string())
    }
}

/// Access token file written by the registry ACL bootstrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenFile {
    #[serde(rename = "SecretID")]
    pub secret_id: String,
}

/// Configuration of the registry header injected on the reserved service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalTokenHeader {
    pub access_token_file_path: PathBuf,
}

impl AdditionalTokenHeader {
    /// The `SecretID` from the access token JSON file. Missing file or empty
    /// id is an error.
    pub fn secret_id(&self, opener: &dyn FileOpener) -> Result<String> {
        let path = &self.access_token_file_path;
        let raw = opener.read(path)?;
        let parsed: AccessTokenFile = serde_json::from_slice(&raw)
            .map_err(|e| ProxyError::decode(path.display().to_string(), e))?;
        if parsed.secret_id.trim().is_empty() {
            return Err(ProxyError::Auth(format!(
                "access token file {} holds an empty SecretID",
                path.display()
            )));
        }
        Ok(parsed.secret_id)
    }
}
