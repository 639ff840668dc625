use crate::core::requestor::{AdminRequest, HttpCaller};
use crate::helpers::tokens::{FileOpener, TokenLoader};
use crate::models::{CertPair, CertSecret, SecretStoreSettings};
use edgeproxy_errors::{ProxyError, Result};
use edgeproxy_utils::join_url;
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Fetches the gateway TLS pair from the secret store using the bootstrap
/// token.
pub struct CertificateLoader {
    caller: Arc<dyn HttpCaller>,
    opener: Arc<dyn FileOpener>,
    token_path: PathBuf,
    base_url: String,
    cert_path: String,
}

impl CertificateLoader {
    pub fn new(
        caller: Arc<dyn HttpCaller>,
        opener: Arc<dyn FileOpener>,
        settings: &SecretStoreSettings,
    ) -> Self {
        Self {
            caller,
            opener,
            token_path: PathBuf::from(&settings.token_file),
            base_url: settings.base_url(),
            cert_path: settings.cert_path.clone(),
        }
    }

    pub async fn load(&self) -> Result<CertPair> {
        let token = TokenLoader::new(self.opener.as_ref()).load(&self.token_path)?;
        let url = join_url(&self.base_url, &[&self.cert_path]);
        let req = AdminRequest::new(Method::GET, url.clone()).header(VAULT_TOKEN_HEADER, token);
        let resp = self.caller.send(req).await?;
        if resp.status != 200 {
            return Err(ProxyError::Gateway {
                endpoint: url,
                status: resp.status,
                body: format!("failed to read certificate at {}: {}", self.cert_path, resp.body),
            });
        }
        let secret: CertSecret =
            serde_json::from_str(&resp.body).map_err(|e| ProxyError::decode(&url, e))?;
        info!(path = %self.cert_path, "loaded certificate pair from secret store");
        Ok(secret.data)
    }

    /// Load and reject empty material in one step.
    pub async fn load_validated(&self) -> Result<CertPair> {
        let pair = self.load().await?;
        pair.validate()?;
        Ok(pair)
    }

    /// GET the secret store root; only 200 counts as up.
    pub async fn check_status(&self) -> Result<()> {
        let resp = self
            .caller
            .send(AdminRequest::new(Method::GET, self.base_url.clone()))
            .await?;
        if resp.status != 200 {
            return Err(ProxyError::gateway(&self.base_url, resp.status, resp.body));
        }
        info!(url = %self.base_url, "secret store is up");
        Ok(())
    }
}
