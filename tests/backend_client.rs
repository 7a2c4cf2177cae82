//! Request shapes against a mock backend

mod common;

use exam_bank::api::{AuthManager, BackendClient, RetryConfig, Role, ValidationStatus};
use exam_bank::import::{ImportBatch, parse_workbook, transform_batch};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;

fn fast_retries() -> RetryConfig {
    RetryConfig {
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        jitter: false,
        ..RetryConfig::default()
    }
}

fn client(server: &Server) -> BackendClient {
    BackendClient::new(server.url(), "anon-key", Duration::from_secs(5))
        .unwrap()
        .with_access_token("user-token")
        .with_retry_config(fast_retries())
}

fn sample_batch() -> ImportBatch {
    let raw = parse_workbook("lighthouse.xlsx", &common::valid_workbook()).unwrap();
    transform_batch(&raw).unwrap()
}

#[tokio::test]
async fn role_lookup_sends_key_and_user_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/rpc/get_my_role")
        .match_header("apikey", "anon-key")
        .match_header("authorization", "Bearer user-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("\"teacher\"")
        .expect(1)
        .create_async()
        .await;

    let role = client(&server).get_my_role().await.unwrap();

    assert_eq!(role, Some(Role::Teacher));
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_or_unknown_role_is_none() {
    let mut server = Server::new_async().await;
    let _null = server
        .mock("POST", "/rest/v1/rpc/get_my_role")
        .with_status(200)
        .with_body("null")
        .create_async()
        .await;

    assert_eq!(client(&server).get_my_role().await.unwrap(), None);

    let mut server = Server::new_async().await;
    let _unknown = server
        .mock("POST", "/rest/v1/rpc/get_my_role")
        .with_status(200)
        .with_body("\"janitor\"")
        .create_async()
        .await;

    assert_eq!(client(&server).get_my_role().await.unwrap(), None);
}

#[tokio::test]
async fn role_lookup_retries_server_errors() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/rpc/get_my_role")
        .with_status(503)
        .with_body("{\"message\":\"upstream unavailable\"}")
        .expect(3)
        .create_async()
        .await;

    let err = client(&server).get_my_role().await.unwrap_err();

    assert!(err.to_string().contains("upstream unavailable"));
    mock.assert_async().await;
}

#[tokio::test]
async fn validation_posts_the_batch_and_reads_the_report() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/rpc/validate_import_passage_with_questions")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "p_passage": { "grade_level": 8, "passage_type": "reading", "audio_url": null }
        })))
        .with_status(200)
        .with_body(
            json!({
                "status": "invalid",
                "errors": [{ "index": 2, "message": "Missing answer_key" }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let report = client(&server).validate_import(&sample_batch()).await.unwrap();

    assert_eq!(report.status, ValidationStatus::Invalid);
    assert_eq!(report.errors[0].to_string(), "Row 2: Missing answer_key");
    mock.assert_async().await;
}

#[tokio::test]
async fn bulk_import_is_sent_once_even_on_server_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/rpc/import_passage_with_questions_bulk")
        .with_status(500)
        .with_body("{\"message\":\"duplicate key value violates unique constraint\"}")
        .expect(1)
        .create_async()
        .await;

    let err = client(&server).import_bulk(&sample_batch()).await.unwrap_err();

    assert_eq!(err.to_string(), "duplicate key value violates unique constraint");
    mock.assert_async().await;
}

#[tokio::test]
async fn generate_exam_returns_the_new_id() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rest/v1/rpc/generate_exam")
        .match_body(Matcher::Json(json!({ "p_grade_level": 9 })))
        .with_status(200)
        .with_body("42")
        .create_async()
        .await;

    assert_eq!(client(&server).generate_exam(9).await.unwrap(), 42);
}

#[tokio::test]
async fn exam_questions_are_selected_with_embedded_options() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Regex("^/rest/v1/exam_questions".to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("exam_id".into(), "eq.42".into()),
            Matcher::UrlEncoded("order".into(), "question_order.asc".into()),
        ]))
        .with_status(200)
        .with_body(
            json!([
                {
                    "question_order": 2,
                    "questions": { "id": 7, "question_text": "Second", "question_type_id": 2, "options": [] }
                },
                {
                    "question_order": 1,
                    "questions": {
                        "id": 5,
                        "question_text": "First",
                        "question_type_id": 1,
                        "options": [
                            { "id": 51, "option_label": "B", "option_text": "no" },
                            { "id": 50, "option_label": "A", "option_text": "yes" }
                        ]
                    }
                },
                { "question_order": 3, "questions": null }
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let questions = client(&server).exam_questions(42).await.unwrap();

    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].question_text, "First");
    assert_eq!(questions[0].options[0].option_label, "A");
    assert!(!questions[1].is_choice());
    mock.assert_async().await;
}

#[tokio::test]
async fn renaming_a_missing_profile_fails() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("PATCH", Matcher::Regex("^/rest/v1/profiles".to_string()))
        .match_header("prefer", "return=representation")
        .match_body(Matcher::Json(json!({ "name": "Mai" })))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let err = client(&server).rename_profile("user-1", "Mai").await.unwrap_err();
    assert!(err.to_string().contains("was not updated"));
}

#[tokio::test]
async fn password_sign_in_builds_a_session() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex("^/auth/v1/token".to_string()))
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_header("apikey", "anon-key")
        .match_body(Matcher::Json(json!({ "email": "t@school.test", "password": "secret" })))
        .with_status(200)
        .with_body(
            json!({
                "access_token": "jwt",
                "refresh_token": "refresh",
                "expires_in": 3600,
                "user": { "id": "u1", "email": "t@school.test", "app_metadata": { "role": "teacher" } }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let auth = AuthManager::new(server.url(), "anon-key", Duration::from_secs(5)).unwrap();
    let session = auth.sign_in_with_password("t@school.test", "secret").await.unwrap();

    assert_eq!(session.access_token, "jwt");
    assert_eq!(session.user.role, Some(Role::Teacher));
    assert!(!session.is_expired(chrono::Utc::now()));
    mock.assert_async().await;
}

#[tokio::test]
async fn wrong_password_surfaces_the_auth_message() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex("^/auth/v1/token".to_string()))
        .with_status(400)
        .with_body("{\"error\":\"invalid_grant\",\"error_description\":\"Invalid login credentials\"}")
        .create_async()
        .await;

    let auth = AuthManager::new(server.url(), "anon-key", Duration::from_secs(5)).unwrap();
    let err = auth.sign_in_with_password("t@school.test", "nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid login credentials");
}

#[tokio::test]
async fn role_assignment_uses_the_service_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/auth/v1/admin/users/u1")
        .match_header("apikey", "service-key")
        .match_header("authorization", "Bearer service-key")
        .match_body(Matcher::Json(json!({ "app_metadata": { "role": "student" } })))
        .with_status(200)
        .with_body("{\"id\":\"u1\"}")
        .expect(1)
        .create_async()
        .await;

    let auth = AuthManager::new(server.url(), "anon-key", Duration::from_secs(5)).unwrap();
    auth.set_user_role("service-key", "u1", Role::Student).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn stalled_auth_service_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    // Accept connections and never answer
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let auth = AuthManager::new(url, "anon-key", Duration::from_millis(200)).unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), auth.refresh("refresh")).await;

    let result = outcome.expect("refresh should give up on its own");
    assert!(result.is_err());
}

#[tokio::test]
async fn null_error_list_counts_as_valid() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rest/v1/rpc/validate_import_passage_with_questions")
        .with_status(200)
        .with_body("{\"status\":\"valid\",\"errors\":null}")
        .create_async()
        .await;

    let report = client(&server).validate_import(&sample_batch()).await.unwrap();

    assert!(report.is_valid());
    assert!(report.errors.is_empty());
}
