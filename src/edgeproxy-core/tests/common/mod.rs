#![allow(dead_code)]

use async_trait::async_trait;
use edgeproxy_core::{AdminRequest, AdminResponse, HttpCaller};
use edgeproxy_errors::Result;
use parking_lot::Mutex;
use reqwest::Method;
use std::io::Write;

type Responder = Box<dyn Fn(&AdminRequest) -> Option<AdminResponse> + Send + Sync>;

/// In-process admin API: records every request and answers from the first
/// matching rule, falling back to a success status per method.
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<AdminRequest>>,
    rules: Mutex<Vec<Responder>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        &self,
        method: Method,
        url_suffix: &str,
        status: u16,
        body: &str,
    ) -> &Self {
        let suffix = url_suffix.to_string();
        let body = body.to_string();
        self.rules.lock().push(Box::new(move |req| {
            (req.method == method && req.url.ends_with(&suffix))
                .then(|| AdminResponse::new(status, body.clone()))
        }));
        self
    }

    pub fn requests(&self) -> Vec<AdminRequest> {
        self.requests.lock().clone()
    }

    /// `METHOD path` with the base URL stripped, in call order.
    pub fn calls(&self, base: &str) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                let path = r.url.strip_prefix(base).unwrap_or(&r.url);
                format!("{} {}", r.method, path.trim_start_matches('/'))
            })
            .collect()
    }
}

#[async_trait]
impl HttpCaller for FakeGateway {
    async fn send(&self, req: AdminRequest) -> Result<AdminResponse> {
        self.requests.lock().push(req.clone());
        for rule in self.rules.lock().iter() {
            if let Some(resp) = rule(&req) {
                return Ok(resp);
            }
        }
        let fallback = match req.method {
            Method::POST => AdminResponse::new(201, "{}"),
            Method::DELETE => AdminResponse::new(204, ""),
            Method::GET => AdminResponse::new(200, r#"{"data":[],"next":null}"#),
            _ => AdminResponse::new(200, "{}"),
        };
        Ok(fallback)
    }
}

pub fn token_file(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

pub fn form_values<'a>(req: &'a AdminRequest, key: &str) -> Vec<&'a str> {
    match &req.body {
        edgeproxy_core::RequestBody::Form(fields) => fields
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect(),
        _ => Vec::new(),
    }
}
