use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;

use super::backend::ImportBackend;
use super::constants::{self, headers, rpc, tables};
use super::models::{Role, ValidationReport};
use super::resilience::{RetryConfig, RetryPolicy};
use crate::exam::{ExamQuestion, ExamSummary, Profile, flatten_exam_rows};
use crate::import::ImportBatch;

/// HTTP client for the hosted backend's REST and RPC endpoints
///
/// Constructed explicitly and passed to whoever needs it; requests carry the
/// project key plus the signed-in user's token when one is set.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    http_client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("exam-bank/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_custom_client(base_url, anon_key, http_client))
    }

    /// Create a client around an existing HTTP client
    pub fn with_custom_client(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            access_token: None,
            http_client,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_policy = RetryPolicy::new(retry_config);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.http_client
            .request(method, url)
            .header(headers::API_KEY, &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Call a remote procedure once
    async fn call_rpc(&self, name: &str, args: &Value) -> Result<Value> {
        let url = constants::rpc_endpoint(&self.base_url, name);
        debug!("POST {}", url);

        let response = self
            .request(Method::POST, &url)
            .header("Content-Type", headers::CONTENT_TYPE_JSON)
            .json(args)
            .send()
            .await
            .with_context(|| format!("Could not reach the backend for '{}'", name))?;

        read_json(response).await
    }

    /// Call a remote procedure that has no side effects, retrying transient failures
    async fn call_rpc_idempotent(&self, name: &str, args: &Value) -> Result<Value> {
        let url = constants::rpc_endpoint(&self.base_url, name);
        debug!("POST {} (idempotent)", url);

        let response = self
            .retry_policy
            .execute(|| {
                self.request(Method::POST, &url)
                    .header("Content-Type", headers::CONTENT_TYPE_JSON)
                    .json(args)
                    .send()
            })
            .await
            .with_context(|| format!("Could not reach the backend for '{}'", name))?;

        read_json(response).await
    }

    async fn select(&self, table: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = constants::table_endpoint(&self.base_url, table);
        debug!("GET {} {:?}", url, params);

        let response = self
            .retry_policy
            .execute(|| self.request(Method::GET, &url).query(params).send())
            .await
            .with_context(|| format!("Could not read '{}'", table))?;

        read_json(response).await
    }

    /// `get_my_role`; `None` when the user has no (known) role
    pub async fn get_my_role(&self) -> Result<Option<Role>> {
        let value = self.call_rpc_idempotent(rpc::GET_MY_ROLE, &json!({})).await?;

        match value {
            Value::Null => Ok(None),
            Value::String(role) => match role.parse::<Role>() {
                Ok(role) => Ok(Some(role)),
                Err(_) => {
                    warn!("Backend returned unknown role '{}'", role);
                    Ok(None)
                }
            },
            other => anyhow::bail!("Unexpected get_my_role response: {}", other),
        }
    }

    /// `generate_exam`; returns the new exam id
    pub async fn generate_exam(&self, grade_level: i64) -> Result<i64> {
        info!("Generating exam for grade {}", grade_level);
        let value = self
            .call_rpc(rpc::GENERATE_EXAM, &json!({ "p_grade_level": grade_level }))
            .await?;

        let exam_id = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        exam_id.with_context(|| format!("Unexpected generate_exam response: {}", value))
    }

    /// `validate_import_passage_with_questions`
    pub async fn validate_import(&self, batch: &ImportBatch) -> Result<ValidationReport> {
        info!("Validating passage with {} questions", batch.questions.len());
        let value = self.call_rpc(rpc::VALIDATE_IMPORT, &batch.to_rpc_args()).await?;
        serde_json::from_value(value).context("Unexpected validation response")
    }

    /// `import_passage_with_questions_bulk`; never retried
    pub async fn import_bulk(&self, batch: &ImportBatch) -> Result<()> {
        info!("Importing passage with {} questions", batch.questions.len());
        self.call_rpc(rpc::IMPORT_BULK, &batch.to_rpc_args()).await?;
        Ok(())
    }

    /// Questions of one exam in exam order, with their options
    pub async fn exam_questions(&self, exam_id: i64) -> Result<Vec<ExamQuestion>> {
        let value = self
            .select(
                tables::EXAM_QUESTIONS,
                &[
                    (
                        "select",
                        "question_order,questions(id,question_text,question_type_id,options(id,option_label,option_text))"
                            .to_string(),
                    ),
                    ("exam_id", format!("eq.{}", exam_id)),
                    ("order", "question_order.asc".to_string()),
                ],
            )
            .await?;

        flatten_exam_rows(value)
    }

    /// The signed-in student's exams, newest first
    pub async fn exam_history(&self) -> Result<Vec<ExamSummary>> {
        let value = self
            .select(
                tables::EXAMS,
                &[
                    ("select", "id,created_at".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;

        serde_json::from_value(value).context("Unexpected exam history response")
    }

    pub async fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let value = self
            .select(
                tables::PROFILES,
                &[
                    ("select", "id,name,level,exp".to_string()),
                    ("id", format!("eq.{}", user_id)),
                ],
            )
            .await?;

        let mut profiles: Vec<Profile> =
            serde_json::from_value(value).context("Unexpected profile response")?;
        Ok(if profiles.is_empty() { None } else { Some(profiles.remove(0)) })
    }

    pub async fn rename_profile(&self, user_id: &str, name: &str) -> Result<()> {
        let url = constants::table_endpoint(&self.base_url, tables::PROFILES);
        info!("Renaming profile {}", user_id);

        let response = self
            .request(Method::PATCH, &url)
            .query(&[("id", format!("eq.{}", user_id))])
            .header("Content-Type", headers::CONTENT_TYPE_JSON)
            .header("Prefer", headers::PREFER_RETURN_REPRESENTATION)
            .json(&json!({ "name": name }))
            .send()
            .await
            .context("Could not reach the backend to update the profile")?;

        let updated = read_json(response).await?;
        if updated.as_array().is_some_and(|rows| rows.is_empty()) {
            anyhow::bail!("Profile '{}' was not updated (not found or not permitted)", user_id);
        }
        Ok(())
    }

    /// Cheap round trip used to check URL and key
    pub async fn ping(&self) -> Result<()> {
        self.select(
            tables::PROFILES,
            &[("select", "id".to_string()), ("limit", "1".to_string())],
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ImportBackend for BackendClient {
    async fn validate_batch(&self, batch: &ImportBatch) -> Result<ValidationReport> {
        self.validate_import(batch).await
    }

    async fn import_batch(&self, batch: &ImportBatch) -> Result<()> {
        self.import_bulk(batch).await
    }
}

/// Body of a successful response as JSON, or the backend's error message
pub(crate) async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;
    debug!("Response status: {}", status);

    if !status.is_success() {
        anyhow::bail!("{}", error_message(status, &body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).context("Backend returned invalid JSON")
}

/// Human-readable message out of a REST or auth error body
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_backend_text() {
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"code":"P0001","message":"Grade level out of range","details":null}"#
            ),
            "Grade level out of range"
        );
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            "Invalid login credentials"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "HTTP 502 Bad Gateway");
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            "HTTP 500 Internal Server Error: oops"
        );
    }
}
