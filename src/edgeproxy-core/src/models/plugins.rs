use crate::models::{AclSettings, AuthMethod, CorsSettings};
use edgeproxy_utils::{encode_segment, split_comma_list};
use serde::{Deserialize, Serialize};

/// Plugin that injects the registry token header on the reserved service.
pub const HEADER_PLUGIN: &str = "request-transformer";
/// Header carrying the registry access token.
pub const REGISTRY_TOKEN_HEADER: &str = "X-Consul-Token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginScope {
    Service(String),
    Route(String),
    Global,
}

impl PluginScope {
    /// Admin API collection the plugin is posted to.
    pub fn collection(&self) -> String {
        match self {
            PluginScope::Service(s) => format!("services/{}/plugins", encode_segment(s)),
            PluginScope::Route(r) => format!("routes/{}/plugins", encode_segment(r)),
            PluginScope::Global => "plugins".into(),
        }
    }
}

/// A plugin to attach. Config keys may repeat; each pair becomes one form
/// field (`config.origins=a&config.origins=b`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginAttachment {
    pub name: String,
    pub scope: PluginScope,
    pub config: Vec<(String, String)>,
}

impl PluginAttachment {
    pub fn new(name: impl Into<String>, scope: PluginScope) -> Self {
        Self {
            name: name.into(),
            scope,
            config: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.config.push((format!("config.{key}"), value.into()));
        self
    }

    /// One field per comma separated item.
    pub fn with_list(mut self, key: &str, list: &str) -> Self {
        for item in split_comma_list(list) {
            self.config.push((format!("config.{key}"), item));
        }
        self
    }

    pub fn form(&self) -> Vec<(String, String)> {
        let mut form = Vec::with_capacity(self.config.len() + 1);
        form.push(("name".to_string(), self.name.clone()));
        form.extend(self.config.iter().cloned());
        form
    }

    // ---------- builders ----------

    pub fn cors(route: &str, cors: &CorsSettings) -> Self {
        Self::new("cors", PluginScope::Route(route.to_string()))
            .with_list("origins", &cors.origins)
            .with_list("methods", &cors.methods)
            .with_list("headers", &cors.headers)
            .with_list("exposed_headers", &cors.exposed_headers)
            .with("credentials", cors.credentials.to_string())
            .with("max_age", cors.max_age.to_string())
    }

    pub fn route_auth(route: &str, auth: &AuthMethod) -> Self {
        let plugin = Self::new(auth.plugin_name(), PluginScope::Route(route.to_string()));
        match auth {
            AuthMethod::Jwt => plugin,
            AuthMethod::Oauth2(o) => plugin
                .with_list("scopes", &o.scope)
                .with("mandatory_scope", "true")
                .with("enable_client_credentials", "true")
                .with("global_credentials", "true")
                .with("token_expiration", o.token_ttl.to_string()),
        }
    }

    pub fn registry_header(service: &str, secret_id: &str) -> Self {
        Self::new(HEADER_PLUGIN, PluginScope::Service(service.to_string())).with(
            "add.headers",
            format!("{REGISTRY_TOKEN_HEADER}:{secret_id}"),
        )
    }

    pub fn global_acl(acl: &AclSettings) -> Self {
        let mut plugin = Self::new(acl.name.clone(), PluginScope::Global);
        for group in acl.whitelist() {
            plugin = plugin.with("whitelist", group);
        }
        plugin
    }
}

/// Plugin as listed by the admin API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
}
