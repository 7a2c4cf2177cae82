//! Role-based route guard
//!
//! One pure function decides, for a viewer and a requested path, whether the
//! request goes through or where it is sent instead. It knows nothing about
//! any particular web framework.

use crate::api::models::Role;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// Who is asking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    /// Signed in; `role` is `None` when the account has not been given one
    SignedIn { role: Option<Role> },
}

impl Viewer {
    pub fn signed_in(role: Option<Role>) -> Self {
        Viewer::SignedIn { role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(String),
}

impl Access {
    fn redirect(path: &str) -> Self {
        Access::Redirect(path.to_string())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Access::Allow => None,
            Access::Redirect(target) => Some(target),
        }
    }
}

/// Path without query, fragment or trailing slash
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { HOME_PATH } else { trimmed }
}

/// Role-owned area a path belongs to, judged by its first segment
pub fn protected_area(path: &str) -> Option<Role> {
    let first_segment = normalize(path).trim_start_matches('/').split('/').next()?;
    Role::ALL.into_iter().find(|role| role.as_str() == first_segment)
}

fn is_auth_page(path: &str) -> bool {
    matches!(normalize(path), LOGIN_PATH | REGISTER_PATH)
}

/// Decide what happens to a request for `path`
///
/// - anonymous viewers may not enter `/student`, `/teacher` or `/admin`
/// - signed-in viewers without a role are sent to the login page
/// - a role may only enter its own area; other areas send it home
/// - signed-in viewers asking for login/register go to their own area
pub fn route_access(viewer: Viewer, path: &str) -> Access {
    let area = protected_area(path);

    match viewer {
        Viewer::Anonymous => match area {
            Some(_) => Access::redirect(LOGIN_PATH),
            None => Access::Allow,
        },
        Viewer::SignedIn { role: None } => {
            // Sending a role-less user to /login from /login would loop
            if is_auth_page(path) {
                Access::Allow
            } else {
                Access::redirect(LOGIN_PATH)
            }
        }
        Viewer::SignedIn { role: Some(role) } => {
            if area.is_some_and(|area| area != role) {
                Access::redirect(HOME_PATH)
            } else if is_auth_page(path) {
                Access::redirect(role.home_path())
            } else {
                Access::Allow
            }
        }
    }
}

/// Gate for a whole area once the role has been looked up remotely
///
/// No role (or a failed lookup) goes to the login page; another role goes to
/// its own area.
pub fn area_access(required: Role, role: Option<Role>) -> Access {
    match role {
        None => Access::redirect(LOGIN_PATH),
        Some(role) if role != required => Access::redirect(role.home_path()),
        Some(_) => Access::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(viewer: Viewer, path: &str) -> Option<String> {
        route_access(viewer, path).redirect_target().map(str::to_string)
    }

    #[test]
    fn anonymous_viewers_are_sent_to_login_from_protected_areas() {
        assert_eq!(target(Viewer::Anonymous, "/teacher/question-bank/import"), Some("/login".into()));
        assert_eq!(target(Viewer::Anonymous, "/admin"), Some("/login".into()));
        assert_eq!(target(Viewer::Anonymous, "/login"), None);
        assert_eq!(target(Viewer::Anonymous, "/"), None);
    }

    #[test]
    fn roles_stay_in_their_own_area() {
        let student = Viewer::signed_in(Some(Role::Student));
        assert_eq!(target(student, "/student/exams/4"), None);
        assert_eq!(target(student, "/teacher"), Some("/".into()));
        assert_eq!(target(student, "/admin/users?page=2"), Some("/".into()));
    }

    #[test]
    fn signed_in_viewers_skip_login_and_register() {
        let teacher = Viewer::signed_in(Some(Role::Teacher));
        assert_eq!(target(teacher, "/login"), Some("/teacher".into()));
        assert_eq!(target(teacher, "/register/"), Some("/teacher".into()));
    }

    #[test]
    fn viewers_without_role_go_to_login_once() {
        let unassigned = Viewer::signed_in(None);
        assert_eq!(target(unassigned, "/student"), Some("/login".into()));
        assert_eq!(target(unassigned, "/"), Some("/login".into()));
        assert_eq!(target(unassigned, "/login"), None);
    }

    #[test]
    fn areas_match_whole_segments_only() {
        assert_eq!(protected_area("/students"), None);
        assert_eq!(protected_area("/teacher"), Some(Role::Teacher));
        assert_eq!(protected_area("/teacher/question-bank"), Some(Role::Teacher));
        assert_eq!(protected_area("/"), None);
    }

    #[test]
    fn area_gate_follows_looked_up_role() {
        assert!(area_access(Role::Teacher, Some(Role::Teacher)).is_allowed());
        assert_eq!(
            area_access(Role::Teacher, Some(Role::Student)),
            Access::Redirect("/student".into())
        );
        assert_eq!(area_access(Role::Teacher, None), Access::Redirect("/login".into()));
    }
}
