use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role stored in the auth user's `app_metadata.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Landing area for the role
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Student => "/student",
            Role::Teacher => "/teacher",
            Role::Admin => "/admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("Unknown role '{}'", other),
        }
    }
}

/// Signed-in user as seen by this client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Tokens issued by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when the token expires within `margin` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}

/// Wire shape of a token grant response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AppMetadata {
    pub role: Option<String>,
}

impl AuthUser {
    pub fn into_session_user(self) -> SessionUser {
        SessionUser {
            id: self.id,
            email: self.email,
            // Unknown role strings are treated as no role
            role: self.app_metadata.role.and_then(|r| r.parse().ok()),
        }
    }
}

impl TokenResponse {
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_in = self.expires_in.unwrap_or(3600);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(expires_in),
            user: self.user.into_session_user(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

/// One problem found in an import batch
///
/// `index` points into the question list of the batch; `None` means the
/// problem concerns the passage or the file as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub index: Option<usize>,
    pub message: String,
}

impl ValidationIssue {
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            index: None,
            message: message.into(),
        }
    }

    pub fn at(index: usize, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "Row {}: {}", index, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of `validate_import_passage_with_questions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    /// Missing and `null` both mean no errors
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<ValidationIssue>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ValidationIssue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ValidationIssue>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert!("principal".parse::<Role>().is_err());
    }

    #[test]
    fn token_response_reads_role_from_app_metadata() {
        let raw = json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 60,
            "refresh_token": "ref",
            "user": { "id": "u1", "email": "a@b.c", "app_metadata": { "role": "teacher" } }
        });
        let response: TokenResponse = serde_json::from_value(raw).unwrap();
        let now = Utc::now();
        let session = response.into_session(now);

        assert_eq!(session.user.role, Some(Role::Teacher));
        assert_eq!(session.expires_at, now + Duration::seconds(60));
        assert!(!session.is_expired(now));
        assert!(session.expires_within(now, Duration::seconds(60)));
    }

    #[test]
    fn unknown_role_in_metadata_becomes_none() {
        let raw = json!({
            "access_token": "tok",
            "user": { "id": "u1", "app_metadata": { "role": "janitor" } }
        });
        let response: TokenResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.into_session(Utc::now()).user.role, None);
    }

    #[test]
    fn invalid_report_carries_indexed_errors() {
        let report: ValidationReport = serde_json::from_value(json!({
            "status": "invalid",
            "errors": [{ "index": 2, "message": "Missing answer_key" }, { "index": null, "message": "Bad passage" }]
        }))
        .unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.errors[0], ValidationIssue::at(2, "Missing answer_key"));
        assert_eq!(report.errors[0].to_string(), "Row 2: Missing answer_key");
        assert_eq!(report.errors[1].to_string(), "Bad passage");
    }

    #[test]
    fn valid_report_may_omit_errors() {
        let report: ValidationReport = serde_json::from_value(json!({ "status": "valid" })).unwrap();
        assert!(report.is_valid());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn valid_report_with_null_errors() {
        let report: ValidationReport =
            serde_json::from_value(json!({ "status": "valid", "errors": null })).unwrap();
        assert!(report.is_valid());
        assert!(report.errors.is_empty());
    }
}
