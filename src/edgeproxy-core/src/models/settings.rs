use edgeproxy_utils::{join_url, split_comma_list};
use serde::{Deserialize, Serialize};

fn def_server() -> String { "kong".into() }
fn def_admin_protocol() -> String { "http".into() }
fn def_admin_port() -> u16 { 8001 }
fn def_app_port() -> u16 { 8000 }
fn def_app_port_ssl() -> u16 { 8443 }

/// Location of the gateway admin and public listeners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KongSettings {
    #[serde(default = "def_server")]
    pub server: String,
    #[serde(default = "def_admin_protocol")]
    pub admin_protocol: String,
    #[serde(default = "def_admin_port")]
    pub admin_port: u16,
    #[serde(default)]
    pub admin_path: String,
    #[serde(default = "def_app_port")]
    pub application_port: u16,
    #[serde(default = "def_app_port_ssl")]
    pub application_port_ssl: u16,
    #[serde(default)]
    pub skip_verify: bool,
    #[serde(default)]
    pub ca_file: String,
}

impl Default for KongSettings {
    fn default() -> Self {
        Self {
            server: def_server(),
            admin_protocol: def_admin_protocol(),
            admin_port: def_admin_port(),
            admin_path: String::new(),
            application_port: def_app_port(),
            application_port_ssl: def_app_port_ssl(),
            skip_verify: false,
            ca_file: String::new(),
        }
    }
}

impl KongSettings {
    pub fn admin_base_url(&self) -> String {
        let root = format!("{}://{}:{}", self.admin_protocol, self.server, self.admin_port);
        join_url(&root, &[&self.admin_path])
    }

    /// Public OAuth2 token endpoint for a proxied resource.
    pub fn token_endpoint(&self, resource: &str) -> String {
        let root = format!("https://{}:{}", self.server, self.application_port_ssl);
        join_url(&root, &[resource, "oauth2", "token"])
    }
}

// ---------- authentication ----------

fn def_resource() -> String { "coredata".into() }
fn def_scope() -> String { "email".into() }
fn def_redirect_uris() -> String { "https://edgex.local".into() }
fn def_token_ttl() -> u64 { 3600 }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth2Settings {
    /// Route the token endpoint is exposed under.
    #[serde(default = "def_resource")]
    pub resource: String,
    #[serde(default = "def_scope")]
    pub scope: String,
    #[serde(default = "def_redirect_uris")]
    pub redirect_uris: String,
    /// Seconds.
    #[serde(default = "def_token_ttl")]
    pub token_ttl: u64,
}

impl Default for OAuth2Settings {
    fn default() -> Self {
        Self {
            resource: def_resource(),
            scope: def_scope(),
            redirect_uris: def_redirect_uris(),
            token_ttl: def_token_ttl(),
        }
    }
}

/// Route authentication installed by Init and credential kind issued to
/// consumers. Selected once when the configuration is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Jwt,
    Oauth2(OAuth2Settings),
}

impl AuthMethod {
    pub fn plugin_name(&self) -> &'static str {
        match self {
            AuthMethod::Jwt => "jwt",
            AuthMethod::Oauth2(_) => "oauth2",
        }
    }
}

// ---------- cors ----------

fn def_origins() -> String { "*".into() }
fn def_methods() -> String { "GET, HEAD, PUT, PATCH, POST, DELETE".into() }

/// List fields are comma separated and sent as repeated form values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorsSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "def_origins")]
    pub origins: String,
    #[serde(default = "def_methods")]
    pub methods: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub exposed_headers: String,
    #[serde(default)]
    pub credentials: bool,
    #[serde(default)]
    pub max_age: u64,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            origins: def_origins(),
            methods: def_methods(),
            headers: String::new(),
            exposed_headers: String::new(),
            credentials: false,
            max_age: 0,
        }
    }
}

// ---------- acl ----------

fn def_acl_name() -> String { "acl".into() }
fn def_acl_group() -> String { "admin".into() }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AclSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "def_acl_name")]
    pub name: String,
    /// Comma separated groups allowed through the global ACL plugin.
    #[serde(default = "def_acl_group")]
    pub whitelist: String,
    /// Group new consumers are associated with.
    #[serde(default = "def_acl_group")]
    pub group: String,
}

impl Default for AclSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            name: def_acl_name(),
            whitelist: def_acl_group(),
            group: def_acl_group(),
        }
    }
}

impl AclSettings {
    pub fn whitelist(&self) -> Vec<String> {
        split_comma_list(&self.whitelist)
    }
}

// ---------- secret store ----------

fn def_ss_protocol() -> String { "https".into() }
fn def_ss_host() -> String { "localhost".into() }
fn def_ss_port() -> u16 { 8200 }
fn def_cert_path() -> String { "v1/secret/edgex/pki/tls/edgex-kong".into() }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretStoreSettings {
    #[serde(default = "def_ss_protocol")]
    pub protocol: String,
    #[serde(default = "def_ss_host")]
    pub host: String,
    #[serde(default = "def_ss_port")]
    pub port: u16,
    #[serde(default = "def_cert_path")]
    pub cert_path: String,
    /// Bootstrap token used to read the certificate pair.
    #[serde(default)]
    pub token_file: String,
    #[serde(default)]
    pub ca_file_path: String,
    /// Extra SNIs, comma separated, merged with the built-in ones.
    #[serde(default)]
    pub snis: String,
    #[serde(default)]
    pub upload_on_init: bool,
}

impl Default for SecretStoreSettings {
    fn default() -> Self {
        Self {
            protocol: def_ss_protocol(),
            host: def_ss_host(),
            port: def_ss_port(),
            cert_path: def_cert_path(),
            token_file: String::new(),
            ca_file_path: String::new(),
            snis: String::new(),
            upload_on_init: false,
        }
    }
}

impl SecretStoreSettings {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}
