//! Route protection rules.
//!
//! The app has five routes. `/` (sign-up) and `/login` are public; `/dashboard`,
//! `/create` and `/edit/:id` need a signed-in user and send everyone else to
//! `/login`.

use crate::session::SessionState;

pub const SIGNUP_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const CREATE_PATH: &str = "/create";
pub const EDIT_PREFIX: &str = "/edit/";

/// What a view should do for the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Render,
    /// The session is still resolving; render nothing yet.
    Wait,
    Redirect(&'static str),
}

pub fn is_protected(path: &str) -> bool {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or(path);
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    path == DASHBOARD_PATH
        || path == CREATE_PATH
        || path
            .strip_prefix(EDIT_PREFIX)
            .is_some_and(|id| !id.is_empty())
}

pub fn resolve(path: &str, session: &SessionState) -> Access {
    if !session.is_resolved() {
        Access::Wait
    } else if is_protected(path) && session.identity().is_none() {
        Access::Redirect(LOGIN_PATH)
    } else {
        Access::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserIdentity;

    fn signed_in() -> SessionState {
        SessionState::Authenticated {
            identity: UserIdentity {
                uid: "u1".to_string(),
                email: "a@b.co".to_string(),
            },
            profile: None,
        }
    }

    #[test]
    fn test_protected_paths() {
        for path in ["/dashboard", "/create", "/edit/123", "/dashboard/", "/edit/123?x=1"] {
            assert!(is_protected(path), "{path}");
        }
        for path in ["/", "/login", "/edit/", "/editor", "/signup"] {
            assert!(!is_protected(path), "{path}");
        }
    }

    #[test]
    fn test_anonymous_is_sent_to_login() {
        for path in ["/dashboard", "/create", "/edit/123"] {
            assert_eq!(resolve(path, &SessionState::Anonymous), Access::Redirect(LOGIN_PATH));
        }
        assert_eq!(resolve("/login", &SessionState::Anonymous), Access::Render);
        assert_eq!(resolve("/", &SessionState::Anonymous), Access::Render);
    }

    #[test]
    fn test_signed_in_renders_everything() {
        for path in ["/", "/login", "/dashboard", "/create", "/edit/123"] {
            assert_eq!(resolve(path, &signed_in()), Access::Render);
        }
    }

    #[test]
    fn test_unresolved_session_waits() {
        assert_eq!(resolve("/dashboard", &SessionState::Uninitialized), Access::Wait);
        assert_eq!(resolve("/login", &SessionState::Resolving), Access::Wait);
    }
}
