use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Jwt,
    Oauth2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    pub kind: CredentialKind,
}

/// Key/secret pair the gateway issues for a consumer's jwt credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtCredential {
    pub key: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2ClientCredential {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuth2ClientCredential {
    /// Client id and secret are both the consumer name.
    pub fn for_consumer(name: &str) -> Self {
        Self {
            client_id: name.to_string(),
            client_secret: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialMaterial {
    Jwt(JwtCredential),
    OAuth2(OAuth2ClientCredential),
}

/// Bearer credential handed back to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub value: String,
    #[serde(default = "def_token_type")]
    pub token_type: String,
    /// Seconds, 0 when the token does not expire.
    #[serde(default)]
    pub expires_in: u64,
}

fn def_token_type() -> String {
    "bearer".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_endpoint_response() {
        let tok: AccessToken = serde_json::from_str(
            r#"{"token_type":"bearer","access_token":"abc","expires_in":7200}"#,
        )
        .unwrap();
        assert_eq!(tok.value, "abc");
        assert_eq!(tok.expires_in, 7200);

        let bare: AccessToken = serde_json::from_str(r#"{"access_token":"x"}"#).unwrap();
        assert_eq!(bare.token_type, "bearer");
        assert_eq!(bare.expires_in, 0);
    }

    #[test]
    fn jwt_credential_ignores_extra_fields() {
        let cred: JwtCredential = serde_json::from_str(
            r#"{"id":"1","key":"k","secret":"s","algorithm":"HS256","consumer":{"id":"c"}}"#,
        )
        .unwrap();
        assert_eq!(cred, JwtCredential { key: "k".into(), secret: "s".into() });
    }
}
