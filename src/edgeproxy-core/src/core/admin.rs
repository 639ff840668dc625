use crate::core::requestor::{AdminRequest, AdminResponse, HttpCaller};
use crate::models::{IdEntry, Page};
use edgeproxy_errors::{ProxyError, Result};
use edgeproxy_utils::join_url;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Result of a create-style call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Created {
    New,
    AlreadyConfigured,
}

/// Authenticated access to the gateway admin API. Every call carries
/// `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct AdminClient {
    caller: Arc<dyn HttpCaller>,
    base: String,
    token: String,
}

impl AdminClient {
    pub fn new(caller: Arc<dyn HttpCaller>, base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            caller,
            base: base.into(),
            token: token.into(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base, &[path])
    }

    fn request(&self, method: Method, path: &str) -> AdminRequest {
        AdminRequest::new(method, self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
    }

    pub async fn send(&self, req: AdminRequest) -> Result<AdminResponse> {
        self.caller.send(req).await
    }

    pub async fn get(&self, path: &str) -> Result<AdminResponse> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn delete(&self, path: &str) -> Result<AdminResponse> {
        self.send(self.request(Method::DELETE, path)).await
    }

    pub async fn post_form(&self, path: &str, form: Vec<(String, String)>) -> Result<AdminResponse> {
        self.send(self.request(Method::POST, path).form(form)).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Result<AdminResponse> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<AdminResponse> {
        self.send(self.request(Method::POST, path)).await
    }

    pub async fn put_empty(&self, path: &str) -> Result<AdminResponse> {
        self.send(self.request(Method::PUT, path)).await
    }

    /// Map a create-style response: 200/201 created, 409 already configured,
    /// anything else is a hard error naming the endpoint.
    pub fn created(&self, path: &str, what: &str, resp: AdminResponse) -> Result<Created> {
        match resp.status {
            200 | 201 => {
                info!(what, "successful to set up");
                Ok(Created::New)
            }
            409 => {
                info!(what, "already configured");
                Ok(Created::AlreadyConfigured)
            }
            status => Err(ProxyError::gateway(self.url(path), status, resp.body)),
        }
    }

    /// Decode a 200 response body, anything else is a hard error.
    pub fn decode_ok<T: DeserializeOwned>(&self, path: &str, resp: AdminResponse) -> Result<T> {
        if resp.status != 200 {
            return Err(ProxyError::gateway(self.url(path), resp.status, resp.body));
        }
        serde_json::from_str(&resp.body).map_err(|e| ProxyError::decode(self.url(path), e))
    }

    /// All object IDs of a collection, following `next` links. A link that
    /// was already fetched ends the walk with a decode error.
    pub async fn list_ids(&self, collection: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.url(collection));
        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                return Err(ProxyError::decode(url, "pagination loop: next link already visited"));
            }
            let req = AdminRequest::new(Method::GET, url.clone())
                .header("Authorization", format!("Bearer {}", self.token));
            let resp = self.send(req).await?;
            if resp.status != 200 {
                return Err(ProxyError::gateway(url, resp.status, resp.body));
            }
            let page: Page<IdEntry> =
                serde_json::from_str(&resp.body).map_err(|e| ProxyError::decode(&url, e))?;
            ids.extend(page.data.into_iter().map(|e| e.id));
            next = page
                .next
                .filter(|n| !n.is_empty())
                .map(|n| self.resolve_next(&n));
        }
        Ok(ids)
    }

    fn resolve_next(&self, next: &str) -> String {
        if next.starts_with("http://") || next.starts_with("https://") {
            return next.to_string();
        }
        // relative links are rooted at the admin base, prefix included
        format!("{}/{}", self.base.trim_end_matches('/'), next.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoCaller;

    #[async_trait::async_trait]
    impl HttpCaller for NoCaller {
        async fn send(&self, req: AdminRequest) -> Result<AdminResponse> {
            Err(ProxyError::transport(req.url, "unreachable"))
        }
    }

    fn client(base: &str) -> AdminClient {
        AdminClient::new(Arc::new(NoCaller), base, "tok")
    }

    #[test]
    fn created_status_mapping() {
        let c = client("http://kong:8001");
        assert_eq!(
            c.created("services", "svc", AdminResponse::new(201, "")).unwrap(),
            Created::New
        );
        assert_eq!(
            c.created("services", "svc", AdminResponse::new(409, "")).unwrap(),
            Created::AlreadyConfigured
        );
        let err = c
            .created("services", "svc", AdminResponse::new(400, "bad"))
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("http://kong:8001/services"));
    }

    #[test]
    fn next_links_resolve_against_admin_root() {
        let c = client("http://kong:8001/admin");
        assert_eq!(
            c.resolve_next("/routes?offset=abc"),
            "http://kong:8001/admin/routes?offset=abc"
        );
        assert_eq!(
            c.resolve_next("https://other:8444/routes?offset=x"),
            "https://other:8444/routes?offset=x"
        );
    }

    type Pages = Box<dyn Fn(&str) -> AdminResponse + Send + Sync>;

    struct PagedCaller {
        pages: Pages,
        seen: parking_lot::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl HttpCaller for PagedCaller {
        async fn send(&self, req: AdminRequest) -> Result<AdminResponse> {
            self.seen.lock().push(req.url.clone());
            Ok((self.pages)(&req.url))
        }
    }

    fn paged(pages: impl Fn(&str) -> AdminResponse + Send + Sync + 'static) -> Arc<PagedCaller> {
        Arc::new(PagedCaller {
            pages: Box::new(pages),
            seen: parking_lot::Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn list_ids_keeps_admin_prefix_on_later_pages() {
        let gw = paged(|url| {
            if url.ends_with("offset=p2") {
                AdminResponse::new(200, r#"{"data":[{"id":"r-2"}],"next":null}"#)
            } else {
                AdminResponse::new(200, r#"{"data":[{"id":"r-1"}],"next":"/routes?offset=p2"}"#)
            }
        });
        let admin = AdminClient::new(gw.clone(), "http://kong:8001/admin", "tok");
        let ids = admin.list_ids("routes").await.unwrap();
        assert_eq!(ids, vec!["r-1", "r-2"]);
        assert_eq!(
            *gw.seen.lock(),
            vec![
                "http://kong:8001/admin/routes".to_string(),
                "http://kong:8001/admin/routes?offset=p2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn list_ids_stops_on_repeated_next_link() {
        let gw = paged(|_| AdminResponse::new(200, r#"{"data":[{"id":"r-1"}],"next":"/routes"}"#));
        let admin = AdminClient::new(gw.clone(), "http://kong:8001", "tok");
        let res = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            admin.list_ids("routes"),
        )
        .await
        .expect("pagination walk must terminate");
        let err = res.unwrap_err();
        assert!(matches!(err, ProxyError::Decode { .. }));
        assert!(err.to_string().contains("http://kong:8001/routes"));
        assert_eq!(gw.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn transport_errors_surface() {
        let err = client("http://kong:8001").get("services").await.unwrap_err();
        assert!(matches!(err, ProxyError::Transport { .. }));
    }
}
