use serde::{Deserialize, Serialize};

/// Object reference inside an admin API listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdEntry {
    pub id: String,
}

/// One page of an admin API listing. `next` is null on the last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_with_next_link() {
        let page: Page<IdEntry> = serde_json::from_str(
            r#"{"data":[{"id":"a","name":"x"},{"id":"b"}],"next":"/routes?offset=abc"}"#,
        )
        .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.next.as_deref(), Some("/routes?offset=abc"));

        let last: Page<IdEntry> = serde_json::from_str(r#"{"data":[],"next":null}"#).unwrap();
        assert!(last.data.is_empty());
        assert!(last.next.is_none());
    }
}
