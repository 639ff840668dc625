use edgeproxy_errors::{ProxyError, Result};
use serde::{Deserialize, Serialize};

/// SNIs every uploaded certificate is registered for.
pub const BUILTIN_SNIS: [&str; 2] = ["localhost", "kong"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertPair {
    pub cert: String,
    pub key: String,
}

impl CertPair {
    pub fn validate(&self) -> Result<()> {
        if self.cert.is_empty() || self.key.is_empty() {
            return Err(ProxyError::EmptyCertPair);
        }
        Ok(())
    }
}

/// Secret store read response: `{"data":{"cert":..,"key":..}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CertSecret {
    pub data: CertPair,
}

/// Body posted to the gateway `certificates` collection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CertInfo {
    pub cert: String,
    pub key: String,
    pub snis: Vec<String>,
}

impl CertInfo {
    pub fn new(pair: CertPair, snis: Vec<String>) -> Self {
        Self {
            cert: pair.cert,
            key: pair.key,
            snis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertUploadOutcome {
    Uploaded,
    AlreadyExists,
    InternalError { status: u16, body: String },
}

impl CertUploadOutcome {
    /// `AlreadyExists` becomes a conflict error, an upload failure keeps the
    /// status the gateway answered with.
    pub fn into_result(self, endpoint: &str) -> Result<()> {
        match self {
            CertUploadOutcome::Uploaded => Ok(()),
            CertUploadOutcome::AlreadyExists => Err(ProxyError::CertUploadConflict {
                body: "existing certificate".into(),
            }),
            CertUploadOutcome::InternalError { status, body } => {
                Err(ProxyError::gateway(endpoint, status, body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_both_fields() {
        let ok = CertPair { cert: "c".into(), key: "k".into() };
        assert!(ok.validate().is_ok());
        for (c, k) in [("", "k"), ("c", ""), ("", "")] {
            let err = CertPair { cert: c.into(), key: k.into() }.validate().unwrap_err();
            assert_eq!(err.to_string(), "empty certificate pair");
        }
    }

    #[test]
    fn secret_store_payload() {
        let s: CertSecret =
            serde_json::from_str(r#"{"data":{"cert":"C","key":"K"},"lease_id":""}"#).unwrap();
        assert_eq!(s.data.cert, "C");
        assert_eq!(s.data.key, "K");
    }

    #[test]
    fn outcome_results() {
        assert!(CertUploadOutcome::Uploaded.into_result("certificates").is_ok());
        assert!(CertUploadOutcome::AlreadyExists
            .into_result("certificates")
            .unwrap_err()
            .is_conflict());
        let err = CertUploadOutcome::InternalError {
            status: 503,
            body: "db down".into(),
        }
        .into_result("http://kong:8001/certificates")
        .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("db down"));
    }
}
