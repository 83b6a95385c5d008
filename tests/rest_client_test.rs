#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use kayako_client::models::{Department, DepartmentModule, StaffGroup, Visibility};
use kayako_client::{Client, Config, KayakoError, RestClient, UrlStyle};

// ── Helpers ─────────────────────────────────────────────────────────

const STAFF_GROUPS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<staffgroups>
    <staffgroup>
        <id>1</id>
        <title>Administrator</title>
        <isadmin>1</isadmin>
    </staffgroup>
    <staffgroup>
        <id>2</id>
        <title>Staff</title>
        <isadmin>0</isadmin>
    </staffgroup>
</staffgroups>"#;

const DEPARTMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<departments>
    <department>
        <id>9</id>
        <title><![CDATA[Support]]></title>
        <type>public</type>
        <module>tickets</module>
        <displayorder>3</displayorder>
        <parentdepartmentid>0</parentdepartmentid>
        <uservisibilitycustom>0</uservisibilitycustom>
        <usergroups></usergroups>
    </department>
</departments>"#;

fn config(server: &MockServer) -> Config {
    Config::new(format!("{}/api/index.php", server.uri()), "key-1", "secret-1").unwrap()
}

async fn setup() -> (MockServer, RestClient, Client) {
    let server = MockServer::start().await;
    let config = config(&server);
    let rest = RestClient::new(config.clone()).unwrap();
    let client = Client::with_transport(config, Arc::new(rest.clone()));
    (server, rest, client)
}

/// Matches requests whose query starts with the controller route.
fn route(controller: &'static str) -> impl Fn(&Request) -> bool + Send + Sync {
    move |req: &Request| {
        req.url
            .query()
            .is_some_and(|q| q.starts_with(controller))
    }
}

fn query_value(req: &Request, name: &str) -> Option<String> {
    req.url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_decodes_xml() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/index.php"))
        .and(route("/Base/StaffGroup"))
        .and(query_param("apikey", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STAFF_GROUPS_XML))
        .expect(1)
        .mount(&server)
        .await;

    let groups = StaffGroup::get_all(&client).await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups.first().unwrap().title(), Some("Administrator"));
    assert!(groups.first().unwrap().is_admin());
    assert!(!groups.at(1).unwrap().is_admin());
}

#[tokio::test]
async fn test_get_request_is_signed() {
    let (server, rest, client) = setup().await;

    Mock::given(method("GET"))
        .and(route("/Base/Department/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DEPARTMENT_XML))
        .mount(&server)
        .await;

    let department = Department::get(&client, 9).await.unwrap();
    assert_eq!(department.title(), Some("Support"));
    assert_eq!(department.display_order(), Some(3));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let salt = query_value(&requests[0], "salt").unwrap();
    let signature = query_value(&requests[0], "signature").unwrap();
    assert!(salt.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(signature, rest.signature(&salt).unwrap());
}

#[tokio::test]
async fn test_e_parameter_url_style() {
    let server = MockServer::start().await;
    let config = config(&server).with_url_style(UrlStyle::EParameter);
    let client = Client::new(config).unwrap();

    Mock::given(method("GET"))
        .and(query_param("e", "/Base/StaffGroup"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STAFF_GROUPS_XML))
        .expect(1)
        .mount(&server)
        .await;

    let groups = StaffGroup::get_all(&client).await.unwrap();
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn test_not_found_status() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Department not found"))
        .mount(&server)
        .await;

    let err = Department::get(&client, 77).await.unwrap_err();
    assert!(
        matches!(err, KayakoError::NotFound { .. }),
        "expected NotFound, got: {err:?}"
    );
}

#[tokio::test]
async fn test_authentication_failure() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Access Denied"))
        .expect(1)
        .mount(&server)
        .await;

    let err = StaffGroup::get_all(&client).await.unwrap_err();
    assert!(matches!(err, KayakoError::Authentication));
}

#[tokio::test]
async fn test_get_retries_unavailable_server() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STAFF_GROUPS_XML))
        .mount(&server)
        .await;

    let groups = StaffGroup::get_all(&client).await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<staffgroups><staffgroup>"))
        .mount(&server)
        .await;

    let err = StaffGroup::get_all(&client).await.unwrap_err();
    assert!(matches!(err, KayakoError::Decode(_)));
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_sends_signed_form() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("POST"))
        .and(route("/Base/Department"))
        .and(body_string_contains("title=Support"))
        .and(body_string_contains("module=tickets"))
        .and(body_string_contains("apikey=key-1"))
        .and(body_string_contains("signature="))
        .respond_with(ResponseTemplate::new(200).set_body_string(DEPARTMENT_XML))
        .expect(1)
        .mount(&server)
        .await;

    let mut department =
        Department::create_new("Support", Visibility::Public, DepartmentModule::Tickets);
    department.create(&client).await.unwrap();

    assert!(!department.is_new());
    assert_eq!(department.id(), Some(9));
}

#[tokio::test]
async fn test_post_is_not_retried() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut department =
        Department::create_new("Support", Visibility::Public, DepartmentModule::Tickets);
    let err = department.create(&client).await.unwrap_err();

    assert!(matches!(err, KayakoError::ServiceUnavailable { .. }));
    assert!(department.is_new());
}

#[tokio::test]
async fn test_delete_sends_identity() {
    let (server, _rest, client) = setup().await;

    Mock::given(method("GET"))
        .and(route("/Base/Department/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DEPARTMENT_XML))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(route("/Base/Department/9"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut department = Department::get(&client, 9).await.unwrap();
    department.delete(&client).await.unwrap();
}

// ── Connection test ─────────────────────────────────────────────────

#[tokio::test]
async fn test_connection_ok() {
    let (server, rest, _client) = setup().await;

    Mock::given(method("GET"))
        .and(route("/Base/StaffGroup"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STAFF_GROUPS_XML))
        .mount(&server)
        .await;

    rest.test_connection().await.unwrap();
}

#[tokio::test]
async fn test_connection_reports_bad_keys() {
    let (server, rest, _client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = rest.test_connection().await.unwrap_err();
    match err {
        KayakoError::ConnectionTest { message } => {
            assert!(message.contains("KAYAKO_API_KEY"));
            assert!(!message.contains("secret-1"));
        }
        other => panic!("expected ConnectionTest, got {other:?}"),
    }
}
