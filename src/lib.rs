//! # Classgate (Session & Route Admission Core)
//!
//! `classgate` is the client-side session authority of the school LMS. It
//! decides whether the current visitor is authenticated, which role they hold,
//! whether a provisional-password teacher must change their password first,
//! and which screen they are entitled to see.
//!
//! ## Session
//!
//! A credential bundle (access token, refresh token, user profile) is issued by
//! the external identity service and persisted through an injected
//! [`session::SessionStore`]. The [`session::SessionManager`] is the only
//! component that interprets it; expiry is read from the access token's `exp`
//! claim and any decode failure counts as expired.
//!
//! ## Routing
//!
//! [`routes::resolve_landing_path`] maps session state to a canonical landing
//! path. The [`routes::RouteGuard`] admits or redirects a protected view, and
//! [`routes::entry_decision`] applies the application route table so entry
//! redirects and guard redirects always agree.
//!
//! The core never verifies credentials or signatures and never talks to the
//! network. Access control is still enforced by the API; this crate only
//! decides what the client shows.

pub mod cli;
pub mod routes;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
