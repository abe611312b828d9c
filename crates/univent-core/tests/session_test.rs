#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use univent_api::{ApiClient, TransportConfig};
use univent_core::{AuthCredentials, CoreError, Role, SessionContext, TicketValidator};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::new(url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn organizer_profile() -> serde_json::Value {
    json!({
        "id": 7,
        "email": "org@univ.ro",
        "firstName": "Ioana",
        "lastName": "Marin",
        "role": "ORGANIZER"
    })
}

#[tokio::test]
async fn password_credentials_establish_organizer_session() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "org@univ.ro", "password": "s3cret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-123",
            "user": organizer_profile()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthCredentials::Password {
        email: "org@univ.ro".into(),
        password: SecretString::from("s3cret".to_owned()),
    };
    let ctx = SessionContext::establish(&client, &auth).await.unwrap();

    assert_eq!(ctx.role(), Role::Organizer);
    assert_eq!(ctx.actor().display_name, "Ioana Marin");
    assert!(ctx.authorize_check_in().is_ok());
    assert!(client.has_token());
}

#[tokio::test]
async fn token_credentials_resolve_student_who_cannot_check_in() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer jwt-student"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s-1",
            "email": "student@univ.ro",
            "role": "STUDENT"
        })))
        .mount(&server)
        .await;

    let auth = AuthCredentials::Token(SecretString::from("jwt-student".to_owned()));
    let ctx = SessionContext::establish(&client, &auth).await.unwrap();

    let err = ctx.authorize_check_in().unwrap_err();
    assert!(matches!(err, CoreError::AccessDenied { role: Role::Student }));
}

#[tokio::test]
async fn expired_token_is_an_authentication_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })))
        .mount(&server)
        .await;

    let auth = AuthCredentials::Token(SecretString::from("old".to_owned()));
    let err = SessionContext::establish(&client, &auth).await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn api_client_validates_tickets() {
    let (server, client) = setup().await;
    client.set_token(SecretString::from("jwt-123".to_owned()));

    Mock::given(method("POST"))
        .and(path("/api/tickets/validate"))
        .and(body_json(json!({ "code": "TICKET-001", "eventId": "E1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "message": "Acces permis",
            "subjectName": "Ana Pop"
        })))
        .mount(&server)
        .await;

    let verdict = client.validate("TICKET-001", "E1").await.unwrap();
    assert!(verdict.valid);
    assert_eq!(verdict.subject_name.as_deref(), Some("Ana Pop"));
}

#[tokio::test]
async fn server_failure_surfaces_as_error() {
    let (server, client) = setup().await;
    client.set_token(SecretString::from("jwt-123".to_owned()));

    Mock::given(method("POST"))
        .and(path("/api/tickets/validate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.validate("TICKET-001", "E1").await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
}
