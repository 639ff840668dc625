use crate::core::admin::{AdminClient, Created};
use crate::core::requestor::AdminRequest;
use crate::core::resource::ResourceDeleter;
use crate::models::{
    AccessToken, AuthMethod, Consumer, CredentialKind, CredentialMaterial, JwtCredential,
    KongSettings, OAuth2ClientCredential, OAuth2Settings,
};
use edgeproxy_crypto::sign_consumer_jwt;
use edgeproxy_errors::{ProxyError, Result};
use edgeproxy_utils::encode_segment;
use reqwest::Method;
use std::time::Duration;
use tracing::{info, warn};

/// Claims applied to locally signed consumer tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenOptions {
    pub audience: Option<String>,
    pub ttl: Option<Duration>,
}

/// Consumer lifecycle and credential issue against the admin API.
pub struct ConsumerManager {
    admin: AdminClient,
    kong: KongSettings,
    auth: AuthMethod,
}

impl ConsumerManager {
    pub fn new(admin: AdminClient, kong: KongSettings, auth: AuthMethod) -> Self {
        Self { admin, kong, auth }
    }

    pub fn kind(&self) -> CredentialKind {
        match self.auth {
            AuthMethod::Jwt => CredentialKind::Jwt,
            AuthMethod::Oauth2(_) => CredentialKind::Oauth2,
        }
    }

    /// PUT `consumers/{name}`; an existing consumer is fine.
    pub async fn create(&self, name: &str) -> Result<Created> {
        let path = format!("consumers/{}", encode_segment(name));
        let resp = self.admin.put_empty(&path).await?;
        self.admin.created(&path, &format!("consumer {name}"), resp)
    }

    pub async fn associate_with_group(&self, name: &str, group: &str) -> Result<Created> {
        let path = format!("consumers/{}/acls", encode_segment(name));
        let form = vec![("group".to_string(), group.to_string())];
        let resp = self.admin.post_form(&path, form).await?;
        self.admin
            .created(&path, &format!("acl group {group} for consumer {name}"), resp)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        ResourceDeleter::new(self.admin.clone())
            .remove(name, "consumers")
            .await
    }

    /// Create the consumer, join it to `groups` and issue its credential.
    pub async fn add_user(
        &self,
        name: &str,
        groups: &[String],
        opts: &TokenOptions,
    ) -> Result<(Consumer, AccessToken)> {
        self.create(name).await?;
        for group in groups {
            self.associate_with_group(name, group).await?;
        }
        let token = self.create_token(name, opts).await?;
        let consumer = Consumer {
            name: name.to_string(),
            groups: groups.to_vec(),
            kind: self.kind(),
        };
        Ok((consumer, token))
    }

    pub async fn create_token(&self, name: &str, opts: &TokenOptions) -> Result<AccessToken> {
        let material = self.issue_credential(name).await?;
        self.exchange(material, opts).await
    }

    /// Ask the gateway for the consumer's credential material.
    pub async fn issue_credential(&self, name: &str) -> Result<CredentialMaterial> {
        match &self.auth {
            AuthMethod::Jwt => {
                info!(consumer = name, "authenticate the user with jwt authentication");
                let path = format!("consumers/{}/jwt", encode_segment(name));
                let resp = self.admin.post_empty(&path).await?;
                match resp.status {
                    200 | 201 => {
                        let cred: JwtCredential = serde_json::from_str(&resp.body)
                            .map_err(|e| ProxyError::decode(self.admin.url(&path), e))?;
                        Ok(CredentialMaterial::Jwt(cred))
                    }
                    status => Err(ProxyError::gateway(self.admin.url(&path), status, resp.body)),
                }
            }
            AuthMethod::Oauth2(settings) => {
                info!(consumer = name, "authenticate the user with oauth2 authentication");
                let client = OAuth2ClientCredential::for_consumer(name);
                let path = format!("consumers/{}/oauth2", encode_segment(name));
                let form = vec![
                    ("name".to_string(), name.to_string()),
                    ("client_id".to_string(), client.client_id.clone()),
                    ("client_secret".to_string(), client.client_secret.clone()),
                    ("redirect_uris".to_string(), settings.redirect_uris.clone()),
                ];
                let resp = self.admin.post_form(&path, form).await?;
                self.admin
                    .created(&path, &format!("oauth2 application for {name}"), resp)?;
                Ok(CredentialMaterial::OAuth2(client))
            }
        }
    }

    /// Turn credential material into a bearer token.
    pub async fn exchange(
        &self,
        material: CredentialMaterial,
        opts: &TokenOptions,
    ) -> Result<AccessToken> {
        match (material, &self.auth) {
            (CredentialMaterial::Jwt(cred), _) => {
                let value =
                    sign_consumer_jwt(&cred.key, &cred.secret, opts.audience.as_deref(), opts.ttl)?;
                Ok(AccessToken {
                    value,
                    token_type: "bearer".into(),
                    expires_in: opts.ttl.map(|t| t.as_secs()).unwrap_or(0),
                })
            }
            (CredentialMaterial::OAuth2(client), AuthMethod::Oauth2(settings)) => {
                self.client_credentials(&client, settings, opts).await
            }
            (CredentialMaterial::OAuth2(_), AuthMethod::Jwt) => Err(ProxyError::Credential(
                "oauth2 credential issued while jwt is configured".into(),
            )),
        }
    }

    async fn client_credentials(
        &self,
        client: &OAuth2ClientCredential,
        settings: &OAuth2Settings,
        opts: &TokenOptions,
    ) -> Result<AccessToken> {
        let url = self.kong.token_endpoint(&settings.resource);
        let form = vec![
            ("client_id".to_string(), client.client_id.clone()),
            ("client_secret".to_string(), client.client_secret.clone()),
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("scope".to_string(), settings.scope.clone()),
        ];
        // public listener, no admin bearer
        let resp = self
            .admin
            .send(AdminRequest::new(Method::POST, url.clone()).form(form))
            .await?;
        match resp.status {
            200 | 201 => {
                let token: AccessToken =
                    serde_json::from_str(&resp.body).map_err(|e| ProxyError::decode(&url, e))?;
                if let Some(ttl) = opts.ttl {
                    if token.expires_in > ttl.as_secs() {
                        warn!(
                            expires_in = token.expires_in,
                            requested = ttl.as_secs(),
                            "gateway issued a token outliving the requested ttl"
                        );
                    }
                }
                Ok(token)
            }
            status => Err(ProxyError::gateway(url, status, resp.body)),
        }
    }
}
