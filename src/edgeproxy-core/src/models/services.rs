use serde::{Deserialize, Serialize};

fn def_protocol() -> String {
    "http".into()
}

// ---------- routes (static config + ADD_PROXY_ROUTE) ----------

/// Where a proxied backend lives. `name` is filled from the map key when a
/// static route leaves it empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RouteSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default = "def_protocol")]
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl RouteSpec {
    pub fn new(
        name: impl Into<String>,
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            host: host.into(),
            port,
        }
    }

    pub fn to_service(&self) -> GatewayService {
        GatewayService {
            name: self.name.clone(),
            host: self.host.clone(),
            port: self.port,
            protocol: self.protocol.clone(),
        }
    }

    /// The route fronting this backend: `/<name>` in lower case.
    pub fn to_route(&self) -> GatewayRoute {
        let lower = self.name.to_lowercase();
        GatewayRoute {
            paths: vec![format!("/{lower}")],
            name: lower,
        }
    }
}

// ---------- gateway objects ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayService {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub protocol: String,
}

impl GatewayService {
    pub fn form(&self) -> Vec<(String, String)> {
        vec![
            ("name".into(), self.name.clone()),
            ("host".into(), self.host.clone()),
            ("port".into(), self.port.to_string()),
            ("protocol".into(), self.protocol.clone()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayRoute {
    pub name: String,
    pub paths: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_is_lowercased_name() {
        let spec = RouteSpec::new("Core-Data", "http", "edgex-core-data", 48080);
        let route = spec.to_route();
        assert_eq!(route.name, "core-data");
        assert_eq!(route.paths, vec!["/core-data".to_string()]);
        // service keeps the configured case
        assert_eq!(spec.to_service().name, "Core-Data");
    }

    #[test]
    fn service_form_fields() {
        let svc = RouteSpec::new("core-data", "http", "edgex-core-data", 48080).to_service();
        let form = svc.form();
        assert!(form.contains(&("port".to_string(), "48080".to_string())));
        assert!(form.contains(&("protocol".to_string(), "http".to_string())));
    }

    #[test]
    fn static_route_defaults_protocol() {
        let spec: RouteSpec = serde_json::from_str(r#"{"host":"h","port":1}"#).unwrap();
        assert_eq!(spec.protocol, "http");
        assert!(spec.name.is_empty());
    }
}
