//! Token signing used by the credential commands.
//!
//! Consumer tokens are HS256 JWTs keyed by the credential the gateway hands
//! out for a consumer. Admin tokens are RS256/ES256 JWTs signed with a local
//! PEM private key.

use chrono::Utc;
use edgeproxy_errors::{ProxyError, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Claims carried by a consumer token. The gateway looks the credential up
/// through `iss`, so it always equals the credential key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumerClaims {
    pub account: String,
    pub iss: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminClaims {
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Asymmetric algorithms accepted by the `jwt` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAlgorithm {
    Rs256,
    Es256,
}

impl AdminAlgorithm {
    fn as_jwt(self) -> Algorithm {
        match self {
            AdminAlgorithm::Rs256 => Algorithm::RS256,
            AdminAlgorithm::Es256 => Algorithm::ES256,
        }
    }

    fn encoding_key(self, pem: &[u8]) -> Result<EncodingKey> {
        let key = match self {
            AdminAlgorithm::Rs256 => EncodingKey::from_rsa_pem(pem),
            AdminAlgorithm::Es256 => EncodingKey::from_ec_pem(pem),
        };
        key.map_err(|e| ProxyError::Credential(format!("invalid {} private key: {}", self, e)))
    }
}

impl fmt::Display for AdminAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminAlgorithm::Rs256 => f.write_str("RS256"),
            AdminAlgorithm::Es256 => f.write_str("ES256"),
        }
    }
}

impl FromStr for AdminAlgorithm {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RS256" => Ok(AdminAlgorithm::Rs256),
            "ES256" => Ok(AdminAlgorithm::Es256),
            other => Err(ProxyError::Credential(format!(
                "unsupported algorithm {other}, expected RS256 or ES256"
            ))),
        }
    }
}

fn secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

/// Sign a consumer token with the gateway issued `{key, secret}` pair.
pub fn sign_consumer_jwt(
    key: &str,
    secret: &str,
    audience: Option<&str>,
    ttl: Option<Duration>,
) -> Result<String> {
    if key.is_empty() || secret.is_empty() {
        return Err(ProxyError::Credential("empty jwt credential".into()));
    }
    let now = Utc::now().timestamp();
    let claims = ConsumerClaims {
        account: key.to_string(),
        iss: key.to_string(),
        aud: audience.filter(|a| !a.is_empty()).map(str::to_string),
        iat: now,
        exp: ttl.map(|t| now.saturating_add(secs(t))),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ProxyError::Credential(format!("sign consumer token: {e}")))
}

/// Sign an admin token with a PEM private key.
pub fn sign_admin_jwt(
    algorithm: AdminAlgorithm,
    private_key_pem: &[u8],
    issuer: &str,
    expiration: Duration,
) -> Result<String> {
    if issuer.is_empty() {
        return Err(ProxyError::Credential("issuer id must not be empty".into()));
    }
    let key = algorithm.encoding_key(private_key_pem)?;
    let now = Utc::now().timestamp();
    let claims = AdminClaims {
        iss: issuer.to_string(),
        iat: now,
        nbf: now,
        exp: now.saturating_add(secs(expiration)),
    };
    encode(&Header::new(algorithm.as_jwt()), &claims, &key)
        .map_err(|e| ProxyError::Credential(format!("sign admin token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use hmac::{Hmac, Mac};
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use sha2::Sha256;

    #[test]
    fn consumer_token_verifies_with_hmac_sha256() {
        let token = sign_consumer_jwt("cred-key", "cred-secret", None, None).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let mut mac = Hmac::<Sha256>::new_from_slice(b"cred-secret").unwrap();
        mac.update(format!("{}.{}", parts[0], parts[1]).as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        assert_eq!(parts[2], expected);

        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(payload["account"], "cred-key");
        assert_eq!(payload["iss"], "cred-key");
        assert!(payload.get("exp").is_none());
        assert!(payload.get("aud").is_none());
    }

    #[test]
    fn consumer_token_carries_audience_and_expiry() {
        let token = sign_consumer_jwt(
            "k",
            "s",
            Some("edge-clients"),
            Some(Duration::from_secs(600)),
        )
        .unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["edge-clients"]);
        let data =
            decode::<ConsumerClaims>(&token, &DecodingKey::from_secret(b"s"), &validation).unwrap();
        assert_eq!(data.claims.aud.as_deref(), Some("edge-clients"));
        assert_eq!(data.claims.exp, Some(data.claims.iat + 600));
    }

    #[test]
    fn consumer_token_rejects_empty_credential() {
        assert!(sign_consumer_jwt("", "secret", None, None).is_err());
        assert!(sign_consumer_jwt("key", "", None, None).is_err());
    }

    #[test]
    fn admin_token_es256_round_trip() {
        let key = rcgen::KeyPair::generate().unwrap();
        let token = sign_admin_jwt(
            AdminAlgorithm::Es256,
            key.serialize_pem().as_bytes(),
            "edge-admin",
            Duration::from_secs(3600),
        )
        .unwrap();

        let public = DecodingKey::from_ec_pem(key.public_key_pem().as_bytes()).unwrap();
        let data = decode::<AdminClaims>(&token, &public, &Validation::new(Algorithm::ES256)).unwrap();
        assert_eq!(data.claims.iss, "edge-admin");
        assert_eq!(data.claims.nbf, data.claims.iat);
        assert_eq!(data.claims.exp, data.claims.iat + 3600);
    }

    #[test]
    fn admin_token_rejects_mismatched_key() {
        let key = rcgen::KeyPair::generate().unwrap();
        let err = sign_admin_jwt(
            AdminAlgorithm::Rs256,
            key.serialize_pem().as_bytes(),
            "edge-admin",
            Duration::from_secs(60),
        )
        .unwrap_err();
        assert!(err.to_string().contains("RS256"));
    }

    #[test]
    fn algorithm_parsing() {
        assert_eq!("rs256".parse::<AdminAlgorithm>().unwrap(), AdminAlgorithm::Rs256);
        assert_eq!("ES256".parse::<AdminAlgorithm>().unwrap(), AdminAlgorithm::Es256);
        assert!("HS256".parse::<AdminAlgorithm>().is_err());
    }
}
