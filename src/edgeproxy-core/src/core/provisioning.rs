use crate::core::admin::{AdminClient, Created};
use crate::core::requestor::{AdminRequest, HttpCaller};
use crate::core::resource::ResourceDeleter;
use crate::core::routes::RouteMap;
use crate::helpers::tokens::{AdditionalTokenHeader, FileOpener, TokenLoader};
use crate::models::{
    AclSettings, AuthMethod, CertInfo, CertPair, CertUploadOutcome, CorsSettings, GatewayRoute,
    GatewayService, KongSettings, Page, PluginAttachment, PluginEntry, RouteSpec, BUILTIN_SNIS,
    HEADER_PLUGIN,
};
use edgeproxy_errors::{ProxyError, Result};
use edgeproxy_utils::{encode_segment, merge_unique, split_comma_list};
use reqwest::Method;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Service key that receives the registry token header plugin.
pub const RESERVED_REGISTRY_KEY: &str = "consul";

/// Collections emptied by reset, in dependency order.
pub const RESET_ORDER: [&str; 5] = ["routes", "services", "consumers", "plugins", "certificates"];

pub const CERTIFICATES: &str = "certificates";

/// Everything Init needs, resolved once from the loaded configuration.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    pub kong: KongSettings,
    pub auth: AuthMethod,
    pub cors: CorsSettings,
    pub acl: AclSettings,
    pub routes: RouteMap,
    pub bearer_token_file: PathBuf,
    pub access_token: Option<AdditionalTokenHeader>,
}

pub struct ProvisioningService {
    caller: Arc<dyn HttpCaller>,
    opener: Arc<dyn FileOpener>,
    config: ProvisioningConfig,
}

impl ProvisioningService {
    pub fn new(
        caller: Arc<dyn HttpCaller>,
        opener: Arc<dyn FileOpener>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            caller,
            opener,
            config,
        }
    }

    /// Reads the bearer token; no token means no admin call at all.
    fn admin(&self) -> Result<AdminClient> {
        let token = TokenLoader::new(self.opener.as_ref()).load(&self.config.bearer_token_file)?;
        Ok(AdminClient::new(
            self.caller.clone(),
            self.config.kong.admin_base_url(),
            token,
        ))
    }

    /// GET the admin root; only 200 counts as up.
    pub async fn check_proxy_status(&self) -> Result<()> {
        let base = self.config.kong.admin_base_url();
        let resp = self
            .caller
            .send(AdminRequest::new(Method::GET, base.clone()))
            .await?;
        if resp.status != 200 {
            return Err(ProxyError::gateway(base, resp.status, resp.body));
        }
        info!(url = %base, "reverse proxy is up");
        Ok(())
    }

    /// Create or repair every route. Stops at the first error and leaves
    /// whatever was already created in place.
    pub async fn init(&self) -> Result<()> {
        let admin = self.admin()?;

        for (key, spec) in &self.config.routes {
            let spec = if spec.name.is_empty() {
                RouteSpec {
                    name: key.clone(),
                    ..spec.clone()
                }
            } else {
                spec.clone()
            };
            let service = spec.to_service();
            self.create_gateway_service(&admin, &service).await?;

            if key.eq_ignore_ascii_case(RESERVED_REGISTRY_KEY) {
                self.inject_registry_header(&admin, &service.name).await?;
            }

            let route = spec.to_route();
            self.create_route(&admin, &service.name, &route).await?;

            if self.config.cors.enabled {
                let cors = PluginAttachment::cors(&route.name, &self.config.cors);
                self.attach_plugin(&admin, &cors).await?;
            }

            let auth = PluginAttachment::route_auth(&route.name, &self.config.auth);
            self.attach_plugin(&admin, &auth).await?;
        }

        if self.config.acl.enabled {
            let acl = PluginAttachment::global_acl(&self.config.acl);
            self.attach_plugin(&admin, &acl).await?;
        }

        info!(routes = self.config.routes.len(), "finished proxy initialization");
        Ok(())
    }

    pub async fn create_gateway_service(
        &self,
        admin: &AdminClient,
        service: &GatewayService,
    ) -> Result<Created> {
        let resp = admin.post_form("services", service.form()).await?;
        admin.created("services", &format!("service {}", service.name), resp)
    }

    pub async fn create_route(
        &self,
        admin: &AdminClient,
        service: &str,
        route: &GatewayRoute,
    ) -> Result<Created> {
        let path = format!("services/{}/routes", encode_segment(service));
        let body = json!({ "name": route.name, "paths": route.paths });
        let resp = admin.post_json(&path, body).await?;
        admin.created(&path, &format!("route {}", route.name), resp)
    }

    pub async fn attach_plugin(
        &self,
        admin: &AdminClient,
        plugin: &PluginAttachment,
    ) -> Result<Created> {
        let path = plugin.scope.collection();
        let resp = admin.post_form(&path, plugin.form()).await?;
        admin.created(&path, &format!("plugin {} on {}", plugin.name, path), resp)
    }

    /// Replace the header plugin on `service` with one carrying the current
    /// registry access token.
    async fn inject_registry_header(&self, admin: &AdminClient, service: &str) -> Result<()> {
        let header = self.config.access_token.as_ref().ok_or_else(|| {
            ProxyError::Config("access token file is not configured".into())
        })?;

        let collection = format!("services/{}/plugins", encode_segment(service));
        let resp = admin.get(&collection).await?;
        let page: Page<PluginEntry> = admin.decode_ok(&collection, resp)?;
        if let Some(existing) = page.data.iter().find(|p| p.name == HEADER_PLUGIN) {
            ResourceDeleter::new(admin.clone())
                .remove(&existing.id, &collection)
                .await?;
        }

        let secret_id = header.secret_id(self.opener.as_ref())?;
        let plugin = PluginAttachment::registry_header(service, &secret_id);
        let resp = admin.post_form(&collection, plugin.form()).await?;
        // the old plugin is gone, so a conflict here is not "already configured"
        if resp.status == 409 {
            return Err(ProxyError::AlreadyExists {
                endpoint: admin.url(&collection),
            });
        }
        if !resp.is_success() {
            return Err(ProxyError::gateway(admin.url(&collection), resp.status, resp.body));
        }
        info!(service, "added registry token header plugin");
        Ok(())
    }

    /// Delete every route, service, consumer, plugin and certificate. The
    /// first failure aborts; nothing is rolled back.
    pub async fn reset_proxy(&self) -> Result<()> {
        let admin = self.admin()?;
        let deleter = ResourceDeleter::new(admin.clone());
        for collection in RESET_ORDER {
            let ids = admin.list_ids(collection).await?;
            for id in &ids {
                deleter.remove(id, collection).await?;
            }
            info!(collection, count = ids.len(), "removed gateway objects");
        }
        Ok(())
    }

    /// Upload a certificate pair for the built-in SNIs plus `extra_snis`.
    pub async fn post_cert(&self, pair: CertPair, extra_snis: &str) -> Result<CertUploadOutcome> {
        pair.validate()?;
        let admin = self.admin()?;
        let body = serde_json::to_value(CertInfo::new(pair, sni_list(extra_snis)))?;
        let resp = admin.post_json(CERTIFICATES, body).await?;
        let outcome = match resp.status {
            200 | 201 => CertUploadOutcome::Uploaded,
            _ if resp.body.contains("existing certificate") => CertUploadOutcome::AlreadyExists,
            status => {
                error!(status, body = %resp.body, "failed to add certificate");
                CertUploadOutcome::InternalError {
                    status,
                    body: resp.body,
                }
            }
        };
        match &outcome {
            CertUploadOutcome::Uploaded => info!("successful to add certificate to the reverse proxy"),
            CertUploadOutcome::AlreadyExists => info!("certificate already exists on the reverse proxy"),
            CertUploadOutcome::InternalError { .. } => {}
        }
        Ok(outcome)
    }
}

/// Built-in SNIs merged with a comma separated extra list.
pub fn sni_list(extra: &str) -> Vec<String> {
    merge_unique(&BUILTIN_SNIS, &split_comma_list(extra))
}
