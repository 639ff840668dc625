use anyhow::{anyhow, Context, Result};
use edgeproxy_core::{
    effective_routes, AclSettings, AdditionalTokenHeader, AuthMethod, CorsSettings, FileOwner,
    KongSettings, ProvisioningConfig, RequestorOptions, RouteMap, SecretStoreSettings,
    TlsInstall, ADD_PROXY_ROUTE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Overrides the configured log filter.
pub const LOG_LEVEL_ENV: &str = "EDGEPROXY_LOG_LEVEL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsInstallCfg {
    #[serde(default = "def_target_folder")]
    pub target_folder: String,
    #[serde(default = "def_cert_filename")]
    pub cert_filename: String,
    #[serde(default = "def_key_filename")]
    pub key_filename: String,
    /// Owner applied to both installed files; unset keeps the invoking user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerCfg>,
}
fn def_target_folder() -> String { "/etc/kong/ssl".into() }
fn def_cert_filename() -> String { "kong.crt".into() }
fn def_key_filename() -> String { "kong.key".into() }

impl Default for TlsInstallCfg {
    fn default() -> Self {
        Self {
            target_folder: def_target_folder(),
            cert_filename: def_cert_filename(),
            key_filename: def_key_filename(),
            owner: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerCfg {
    pub uid: u32,
    pub gid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingCfg {
    #[serde(default = "def_level")]
    pub level: String,
    /// json | pretty | compact
    #[serde(default = "def_mode")]
    pub mode: String,
}
fn def_level() -> String { "info".into() }
fn def_mode() -> String { "compact".into() }

impl Default for LoggingCfg {
    fn default() -> Self {
        Self {
            level: def_level(),
            mode: def_mode(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub kong: KongSettings,
    #[serde(default)]
    pub auth: AuthMethod,
    #[serde(default)]
    pub acl: AclSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub secret_store: SecretStoreSettings,
    #[serde(default)]
    pub routes: RouteMap,
    #[serde(default = "def_bearer_token_file")]
    pub bearer_token_file: String,
    #[serde(default = "def_root_token_file")]
    pub root_token_file: String,
    /// Registry ACL token JSON (`SecretID`), needed when a reserved route
    /// is configured.
    #[serde(default)]
    pub access_token_file: String,
    #[serde(default = "def_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub tls_install: TlsInstallCfg,
    #[serde(default)]
    pub logging: LoggingCfg,
    /// Raw `ADD_PROXY_ROUTE` value picked up by [`ProxyConfig::apply_env`].
    #[serde(skip)]
    pub additional_routes: Option<String>,
}
fn def_bearer_token_file() -> String { "/run/edgeproxy/secrets/admin-token".into() }
fn def_root_token_file() -> String { "/run/edgeproxy/secrets/root-token".into() }
fn def_timeout() -> u64 { 10_000 }

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            kong: KongSettings::default(),
            auth: AuthMethod::default(),
            acl: AclSettings::default(),
            cors: CorsSettings::default(),
            secret_store: SecretStoreSettings::default(),
            routes: RouteMap::new(),
            bearer_token_file: def_bearer_token_file(),
            root_token_file: def_root_token_file(),
            access_token_file: String::new(),
            request_timeout_ms: def_timeout(),
            tls_install: TlsInstallCfg::default(),
            logging: LoggingCfg::default(),
            additional_routes: None,
        }
    }
}

impl ProxyConfig {
    /// Fill empty route names from their keys and reject unusable values.
    fn normalize(mut self) -> Result<Self> {
        for (key, spec) in self.routes.iter_mut() {
            if spec.name.is_empty() {
                spec.name = key.clone();
            }
            if spec.host.is_empty() {
                return Err(anyhow!("route {} has an empty host", key));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(anyhow!("request_timeout_ms must be greater than zero"));
        }
        Ok(self)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|k| std::env::var(k).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ADD_PROXY_ROUTE).filter(|v| !v.trim().is_empty()) {
            debug!(routes = %raw, "additional routes from environment");
            self.additional_routes = Some(raw);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.logging.level = level;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn provisioning(&self) -> ProvisioningConfig {
        let access_token = (!self.access_token_file.is_empty()).then(|| AdditionalTokenHeader {
            access_token_file_path: PathBuf::from(&self.access_token_file),
        });
        ProvisioningConfig {
            kong: self.kong.clone(),
            auth: self.auth.clone(),
            cors: self.cors.clone(),
            acl: self.acl.clone(),
            routes: effective_routes(&self.routes, self.additional_routes.as_deref()),
            bearer_token_file: PathBuf::from(&self.bearer_token_file),
            access_token,
        }
    }

    /// Client options for the gateway admin API.
    pub fn admin_requestor(&self) -> Result<RequestorOptions> {
        requestor_options(self.kong.skip_verify, &self.kong.ca_file, self.request_timeout())
    }

    /// Client options for the secret store.
    pub fn secret_store_requestor(&self) -> Result<RequestorOptions> {
        requestor_options(false, &self.secret_store.ca_file_path, self.request_timeout())
    }

    pub fn tls_install(&self, target_folder: Option<&str>) -> TlsInstall {
        TlsInstall {
            target_folder: PathBuf::from(target_folder.unwrap_or(&self.tls_install.target_folder)),
            cert_filename: self.tls_install.cert_filename.clone(),
            key_filename: self.tls_install.key_filename.clone(),
            owner: self.tls_install.owner.map(|o| FileOwner {
                uid: o.uid,
                gid: o.gid,
            }),
        }
    }
}

fn requestor_options(skip_verify: bool, ca_file: &str, timeout: Duration) -> Result<RequestorOptions> {
    let ca_pem = if skip_verify || ca_file.is_empty() {
        None
    } else {
        Some(fs::read(ca_file).with_context(|| format!("read CA bundle {}", ca_file))?)
    };
    Ok(RequestorOptions {
        skip_verify,
        ca_pem,
        timeout,
    })
}

pub fn load_config(path: &str) -> Result<ProxyConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    let cfg: ProxyConfig = if path.ends_with(".yaml") || path.ends_with(".yml") {
        serde_yml::from_str(&content).with_context(|| format!("parse config {}", path))?
    } else if path.ends_with(".json") {
        serde_json::from_str(&content).with_context(|| format!("parse config {}", path))?
    } else if path.ends_with(".toml") {
        toml::from_str(&content).with_context(|| format!("parse config {}", path))?
    } else {
        return Err(anyhow!("Unknown config extension: {}", path));
    };
    cfg.normalize()
}
