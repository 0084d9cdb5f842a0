//! Publisher tests against a wiremock stand-in for Azure AD and Power BI.

use chrono::NaiveDate;
use lifetime_analytics::{aggregate, SummaryRow};
use lifetime_core::config::PowerBiConfig;
use lifetime_core::{Granularity, Observation};
use lifetime_powerbi::{PublishError, PublishOutcome, Publisher};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUSH_PATH: &str = "/beta/tenant-1/datasets/ds-42/rows";
const DELETE_PATH: &str = "/v1.0/myorg/groups/ws-7/datasets/ds-42/tables/RealTimeData/rows";
const TOKEN_PATH: &str = "/tenant-1/oauth2/token";

fn config_for(server: &MockServer) -> PowerBiConfig {
    PowerBiConfig {
        push_url: Some(format!("{}{}?key=abc", server.uri(), PUSH_PATH)),
        clear: true,
        tenant_id: Some("tenant-1".into()),
        client_id: Some("client-1".into()),
        client_secret: Some("secret-1".into()),
        workspace_id: Some("ws-7".into()),
        authority_host: server.uri(),
        api_base: format!("{}/v1.0/myorg", server.uri()),
        ..PowerBiConfig::default()
    }
}

fn rows() -> Vec<SummaryRow> {
    let day = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
    let observations = vec![
        Observation::new(day, "teamA", 2.0),
        Observation::new(day, "teamA", 4.0),
        Observation::new(day, "teamB", 6.0),
    ];
    aggregate(&observations, Granularity::Day)
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "token-xyz"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_push_sends_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(body_json(json!([
            { "day": "2021-03-01", "group": "total", "medianLifetime": 4.0, "meanLifetime": 4.0 },
            { "day": "2021-03-01", "group": "teamA", "medianLifetime": 3.0, "meanLifetime": 3.0 },
            { "day": "2021-03-01", "group": "teamB", "medianLifetime": 6.0, "meanLifetime": 6.0 }
        ])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::from_config(&config_for(&server)).unwrap().unwrap();
    let outcome = publisher.push_rows(&rows()).await;
    assert!(outcome.is_success(), "got: {outcome:?}");
}

#[tokio::test]
async fn test_push_failure_is_reported_not_raised() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad row"))
        .mount(&server)
        .await;

    let publisher = Publisher::from_config(&config_for(&server)).unwrap().unwrap();
    let outcome = publisher.push_rows(&rows()).await;
    assert_eq!(
        outcome,
        PublishOutcome::Rejected {
            status: 400,
            body: "bad row".into()
        }
    );
}

#[tokio::test]
async fn test_clear_then_push() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("DELETE"))
        .and(path(DELETE_PATH))
        .and(header("authorization", "Bearer token-xyz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::from_config(&config_for(&server)).unwrap().unwrap();
    let outcome = publisher.publish(&rows(), Some("ds-42")).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_clear_http_failure_still_pushes() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("DELETE"))
        .and(path(DELETE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("dataset not found"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = Publisher::from_config(&config_for(&server)).unwrap().unwrap();
    let cleared = publisher.clear_rows("ds-42").await.unwrap();
    assert_eq!(
        cleared,
        PublishOutcome::Rejected {
            status: 404,
            body: "dataset not found".into()
        }
    );

    let outcome = publisher.publish(&rows(), Some("ds-42")).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_auth_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(DELETE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let publisher = Publisher::from_config(&config_for(&server)).unwrap().unwrap();
    let err = publisher.publish(&rows(), Some("ds-42")).await.unwrap_err();
    match err {
        PublishError::Auth(message) => assert!(message.contains("Invalid client secret")),
        other => panic!("unexpected error: {other}"),
    }
}
