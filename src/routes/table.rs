//! Application route table and top-level entry redirection.
//!
//! Public-only routes (login, registration, password reset) send signed-in
//! visitors to their landing path; verification and registration-success pages
//! are always reachable; protected routes go through the guard; `/` and
//! unknown paths redirect to the landing path.

use crate::routes::guard::ProtectedView;
use crate::routes::landing::paths;
use crate::session::{clock::Clock, manager::SessionManager, store::SessionStore, types::Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Reachable by anyone.
    Public,
    /// Reachable only while signed out.
    SignedOutOnly,
    /// Behind the admission guard.
    Protected(Option<Role>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    /// Path pattern; `:name` segments match any single non-empty segment.
    pub pattern: &'static str,
    pub access: Access,
}

pub const ROUTES: &[Route] = &[
    Route {
        pattern: paths::LOGIN,
        access: Access::SignedOutOnly,
    },
    Route {
        pattern: "/register",
        access: Access::SignedOutOnly,
    },
    Route {
        pattern: "/forgot-password",
        access: Access::SignedOutOnly,
    },
    Route {
        pattern: "/reset-password/:token",
        access: Access::SignedOutOnly,
    },
    Route {
        pattern: "/verify-email/:token",
        access: Access::Public,
    },
    Route {
        pattern: "/registration-success",
        access: Access::Public,
    },
    Route {
        pattern: paths::PARENT_DASHBOARD,
        access: Access::Protected(Some(Role::Parent)),
    },
    Route {
        pattern: paths::TEACHER_DASHBOARD,
        access: Access::Protected(Some(Role::Teacher)),
    },
    Route {
        pattern: paths::FORCED_PASSWORD_CHANGE,
        access: Access::Protected(Some(Role::Teacher)),
    },
    Route {
        pattern: paths::ADMIN_DASHBOARD,
        access: Access::Protected(Some(Role::Admin)),
    },
    Route {
        pattern: "/newsfeed",
        access: Access::Protected(Some(Role::Teacher)),
    },
];

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn matches(pattern: &str, path: &str) -> bool {
    let mut expected = segments(pattern);
    let mut actual = segments(path);
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return true,
            (Some(want), Some(got)) => {
                if !want.starts_with(':') && want != got {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Strip query string and fragment.
fn route_path(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or_default()
}

/// Route entry for `path`, if any.
#[must_use]
pub fn find_route(path: &str) -> Option<&'static Route> {
    let path = route_path(path);
    ROUTES.iter().find(|route| matches(route.pattern, path))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryDecision {
    /// Show the page as-is.
    Render,
    /// Mount the page behind a route guard.
    Guard(ProtectedView),
    /// Navigate elsewhere, replacing the history entry.
    Redirect(&'static str),
}

/// Decide what to do when the app is entered at `path`.
pub fn entry_decision<S, C>(path: &str, session: &SessionManager<S, C>) -> EntryDecision
where
    S: SessionStore,
    C: Clock,
{
    let Some(route) = find_route(path) else {
        return EntryDecision::Redirect(session.landing_path());
    };

    match route.access {
        Access::Public => EntryDecision::Render,
        Access::SignedOutOnly if session.is_authenticated() => {
            EntryDecision::Redirect(session.landing_path())
        }
        Access::SignedOutOnly => EntryDecision::Render,
        Access::Protected(required_role) => {
            EntryDecision::Guard(ProtectedView::new(route.pattern, required_role))
        }
    }
}
