use edgeproxy_core::{
    AdminClient, AdminRequest, HttpCaller, Requestor, RequestorOptions,
};
use edgeproxy_errors::ProxyError;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn requestor() -> Requestor {
    Requestor::new(&RequestorOptions {
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn form_goes_out_urlencoded_with_repeated_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/routes/core-data/plugins"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("authorization", "Bearer root-token"))
        .and(body_string("name=cors&config.origins=a&config.origins=b"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"p-1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let admin = AdminClient::new(Arc::new(requestor()), server.uri(), "root-token");
    let form = vec![
        ("name".to_string(), "cors".to_string()),
        ("config.origins".to_string(), "a".to_string()),
        ("config.origins".to_string(), "b".to_string()),
    ];
    let resp = admin.post_form("routes/core-data/plugins", form).await.unwrap();
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, r#"{"id":"p-1"}"#);
}

#[tokio::test]
async fn json_body_and_bearer_reach_the_wire() {
    let server = MockServer::start().await;
    let body = json!({ "name": "core-data", "paths": ["/core-data"] });
    Mock::given(method("POST"))
        .and(path("/services/core-data/routes"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer root-token"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let admin = AdminClient::new(Arc::new(requestor()), server.uri(), "root-token");
    let resp = admin.post_json("services/core-data/routes", body).await.unwrap();
    assert_eq!(resp.status, 201);
}

#[tokio::test]
async fn non_success_status_is_not_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/consumers/alice"))
        .respond_with(ResponseTemplate::new(409).set_body_string("unique constraint"))
        .mount(&server)
        .await;

    let req = AdminRequest::new(Method::PUT, format!("{}/consumers/alice", server.uri()));
    let resp = requestor().send(req).await.unwrap();
    assert_eq!(resp.status, 409);
    assert_eq!(resp.body, "unique constraint");
    assert!(!resp.is_success());
}

#[tokio::test]
async fn connection_failure_maps_to_transport() {
    // nothing listens on port 1
    let url = "http://127.0.0.1:1/status";
    let err = requestor()
        .send(AdminRequest::new(Method::GET, url))
        .await
        .unwrap_err();
    match err {
        ProxyError::Transport { endpoint, .. } => assert_eq!(endpoint, url),
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn paginated_listing_under_admin_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/routes"))
        .and(query_param("offset", "p2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"data":[{"id":"r-2"}],"next":null}"#),
        )
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data":[{"id":"r-1"}],"next":"/routes?offset=p2"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/admin", server.uri());
    let admin = AdminClient::new(Arc::new(requestor()), base, "root-token");
    let ids = admin.list_ids("routes").await.unwrap();
    assert_eq!(ids, vec!["r-1", "r-2"]);
}
