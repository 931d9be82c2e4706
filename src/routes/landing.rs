//! Canonical landing paths. Both entry redirection and guard redirection go
//! through [`resolve_landing_path`] so they can never disagree.

use crate::session::types::Role;

pub mod paths {
    pub const LOGIN: &str = "/login";
    pub const FORCED_PASSWORD_CHANGE: &str = "/teacher-change-password";
    pub const TEACHER_DASHBOARD: &str = "/teacher-dashboard";
    pub const ADMIN_DASHBOARD: &str = "/admin-dashboard";
    pub const PARENT_DASHBOARD: &str = "/dashboard";
}

/// Where a visitor in this state belongs. Priority: authentication, then the
/// pending password change, then role. Unknown or missing roles land on the
/// parent dashboard.
#[must_use]
pub const fn resolve_landing_path(
    authenticated: bool,
    role: Option<Role>,
    password_change_required: bool,
) -> &'static str {
    if !authenticated {
        return paths::LOGIN;
    }

    match role {
        Some(Role::Teacher) if password_change_required => paths::FORCED_PASSWORD_CHANGE,
        Some(Role::Teacher) => paths::TEACHER_DASHBOARD,
        Some(Role::Admin) => paths::ADMIN_DASHBOARD,
        Some(Role::Parent | Role::Unknown) | None => paths::PARENT_DASHBOARD,
    }
}
