use crate::core::admin::AdminClient;
use edgeproxy_errors::{ProxyError, Result};
use edgeproxy_utils::encode_segment;
use tracing::info;

/// Deletes one object under an admin API collection.
#[derive(Clone)]
pub struct ResourceDeleter {
    admin: AdminClient,
}

impl ResourceDeleter {
    pub fn new(admin: AdminClient) -> Self {
        Self { admin }
    }

    /// DELETE `{base}/{path}/{id}`; 200, 201 and 204 succeed. `id` is sent
    /// as a single encoded segment.
    pub async fn remove(&self, id: &str, path: &str) -> Result<()> {
        let target = format!("{}/{}", path.trim_end_matches('/'), encode_segment(id));
        let resp = self.admin.delete(&target).await?;
        match resp.status {
            200 | 201 | 204 => {
                info!(id, path, "successful to delete object");
                Ok(())
            }
            status => Err(ProxyError::Delete {
                endpoint: self.admin.url(&target),
                collection: path.to_string(),
                id: id.to_string(),
                status,
                body: resp.body,
            }),
        }
    }
}
