//! Endpoint paths and header names for the hosted backend

/// REST (PostgREST) base path
pub const REST_PATH: &str = "/rest/v1";

/// Auth (GoTrue) base path
pub const AUTH_PATH: &str = "/auth/v1";

/// Remote procedure names
pub mod rpc {
    pub const GET_MY_ROLE: &str = "get_my_role";
    pub const GENERATE_EXAM: &str = "generate_exam";
    pub const VALIDATE_IMPORT: &str = "validate_import_passage_with_questions";
    pub const IMPORT_BULK: &str = "import_passage_with_questions_bulk";
}

/// Tables read directly through the REST interface
pub mod tables {
    pub const EXAM_QUESTIONS: &str = "exam_questions";
    pub const EXAMS: &str = "exams";
    pub const PROFILES: &str = "profiles";
}

pub mod headers {
    /// Project key header expected on every request
    pub const API_KEY: &str = "apikey";

    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Ask PostgREST to echo the written rows back
    pub const PREFER_RETURN_REPRESENTATION: &str = "return=representation";
}

pub fn rpc_endpoint(base_url: &str, name: &str) -> String {
    format!("{}{}/rpc/{}", trim_base(base_url), REST_PATH, name)
}

pub fn table_endpoint(base_url: &str, table: &str) -> String {
    format!("{}{}/{}", trim_base(base_url), REST_PATH, table)
}

/// Token endpoint for the given grant (`password` or `refresh_token`)
pub fn token_endpoint(base_url: &str, grant_type: &str) -> String {
    format!("{}{}/token?grant_type={}", trim_base(base_url), AUTH_PATH, grant_type)
}

pub fn signup_endpoint(base_url: &str) -> String {
    format!("{}{}/signup", trim_base(base_url), AUTH_PATH)
}

pub fn logout_endpoint(base_url: &str) -> String {
    format!("{}{}/logout", trim_base(base_url), AUTH_PATH)
}

pub fn admin_user_endpoint(base_url: &str, user_id: &str) -> String {
    format!("{}{}/admin/users/{}", trim_base(base_url), AUTH_PATH, user_id)
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_ignore_trailing_slash() {
        assert_eq!(
            rpc_endpoint("https://demo.example.co/", rpc::GET_MY_ROLE),
            "https://demo.example.co/rest/v1/rpc/get_my_role"
        );
        assert_eq!(
            token_endpoint("https://demo.example.co", "password"),
            "https://demo.example.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            admin_user_endpoint("https://demo.example.co", "abc"),
            "https://demo.example.co/auth/v1/admin/users/abc"
        );
    }
}
