use async_trait::async_trait;
use edgeproxy_errors::{ProxyError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// Form fields; keys may repeat.
    Form(Vec<(String, String)>),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl AdminRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminResponse {
    pub status: u16,
    pub body: String,
}

impl AdminResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Send one request and hand back status and body. Non-2xx statuses are
/// not errors at this level; only transport failures are.
#[async_trait]
pub trait HttpCaller: Send + Sync {
    async fn send(&self, req: AdminRequest) -> Result<AdminResponse>;
}

pub fn encode_form(fields: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .finish()
}

#[derive(Debug, Clone)]
pub struct RequestorOptions {
    pub skip_verify: bool,
    /// PEM bundle trusted in addition to the platform roots.
    pub ca_pem: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl Default for RequestorOptions {
    fn default() -> Self {
        Self {
            skip_verify: false,
            ca_pem: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// reqwest backed [`HttpCaller`].
#[derive(Debug, Clone)]
pub struct Requestor {
    client: reqwest::Client,
}

impl Requestor {
    pub fn new(opts: &RequestorOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(opts.timeout);

        if opts.skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        } else if let Some(pem) = &opts.ca_pem {
            let certs = reqwest::Certificate::from_pem_bundle(pem)
                .map_err(|e| ProxyError::Config(format!("invalid CA bundle: {e}")))?;
            if certs.is_empty() {
                return Err(ProxyError::Config("CA bundle holds no certificates".into()));
            }
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder
            .build()
            .map_err(|e| ProxyError::Config(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpCaller for Requestor {
    async fn send(&self, req: AdminRequest) -> Result<AdminResponse> {
        debug!(method = %req.method, url = %req.url, "admin request");
        let mut rb = self.client.request(req.method.clone(), &req.url);
        for (name, value) in &req.headers {
            rb = rb.header(name.as_str(), value.as_str());
        }
        rb = match &req.body {
            RequestBody::Empty => rb,
            RequestBody::Form(fields) => rb
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encode_form(fields)),
            RequestBody::Json(v) => rb.json(v),
        };

        let resp = rb
            .send()
            .await
            .map_err(|e| ProxyError::transport(&req.url, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ProxyError::transport(&req.url, e))?;
        debug!(url = %req.url, status, "admin response");
        Ok(AdminResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_keeps_repeated_keys() {
        let fields = vec![
            ("name".to_string(), "cors".to_string()),
            ("config.origins".to_string(), "https://a.example".to_string()),
            ("config.origins".to_string(), "*".to_string()),
        ];
        assert_eq!(
            encode_form(&fields),
            "name=cors&config.origins=https%3A%2F%2Fa.example&config.origins=*"
        );
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = AdminRequest::new(Method::GET, "http://kong:8001")
            .header("Authorization", "Bearer t");
        assert_eq!(req.header_value("authorization"), Some("Bearer t"));
        assert_eq!(req.header_value("X-Vault-Token"), None);
    }

    #[test]
    fn requestor_rejects_garbage_ca() {
        let opts = RequestorOptions {
            ca_pem: Some(b"not a pem".to_vec()),
            ..Default::default()
        };
        assert!(Requestor::new(&opts).is_err());
    }

    #[test]
    fn requestor_builds_in_skip_verify_mode() {
        let opts = RequestorOptions {
            skip_verify: true,
            ..Default::default()
        };
        assert!(Requestor::new(&opts).is_ok());
    }
}
