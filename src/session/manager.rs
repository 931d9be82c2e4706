//! Session facade: the single authority on "is there a usable session, who is
//! it, and what must they do next".
//!
//! Flow Overview: a bundle is established after login or an auto-authenticating
//! email verification; queries read it back through the store and check the
//! access token's expiry against the injected clock; the provisional-password
//! flag is cleared in place after a successful change; logout, an API 401, or
//! an expired token found during a guard check destroy the bundle.
//!
//! Read failures are logged and answered as "no session". No network calls
//! originate here; renewal and issuance belong to the identity service.

use crate::routes::landing::{paths, resolve_landing_path};
use crate::session::{
    clock::{Clock, SystemClock},
    store::{SessionStore, StoreError},
    token,
    types::{CredentialBundle, LoginResponse, Profile, Role},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Point-in-time view of the session, without token material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub user_id: Option<u64>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password_change_required: bool,
    pub landing_path: &'static str,
}

pub struct SessionManager<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: SessionStore, C: Clock> SessionManager<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn stored(&self) -> Option<CredentialBundle> {
        match self.store.load() {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!("failed to read session store: {err}");
                None
            }
        }
    }

    fn is_live(&self, bundle: &CredentialBundle) -> bool {
        !token::is_expired_at(
            bundle.access_token().expose_secret(),
            self.clock.now_unix_seconds(),
        )
    }

    /// Stored bundle, only while its access token is usable.
    fn live(&self) -> Option<CredentialBundle> {
        self.stored().filter(|bundle| self.is_live(bundle))
    }

    /// True iff a complete bundle is stored and its access token has not
    /// expired.
    pub fn is_authenticated(&self) -> bool {
        self.live().is_some()
    }

    /// Profile of the stored bundle, regardless of token expiry.
    pub fn current_user(&self) -> Option<Profile> {
        self.stored().map(|bundle| bundle.profile().clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.stored().map(|bundle| bundle.profile().role())
    }

    /// True iff the stored user is a teacher still on a provisional password.
    pub fn requires_password_change(&self) -> bool {
        self.stored()
            .is_some_and(|bundle| bundle.profile().password_change_required())
    }

    /// Full bundle for collaborators that need it (API client, revalidation).
    /// `None` when signed out or expired.
    pub fn credentials(&self) -> Option<CredentialBundle> {
        self.live()
    }

    /// Access token for an authenticated API call.
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.live().map(|bundle| bundle.access_token().clone())
    }

    /// Persist a freshly issued bundle.
    ///
    /// # Errors
    /// Returns an error if the store cannot write the bundle.
    pub fn establish(&self, bundle: &CredentialBundle) -> Result<(), SessionError> {
        self.store.save(bundle)?;
        info!(
            user_id = bundle.profile().id,
            role = %bundle.profile().role(),
            "session established"
        );
        Ok(())
    }

    /// Persist the bundle from a login or verification response and return
    /// where the user should land.
    ///
    /// # Errors
    /// Returns an error if the store cannot write the bundle.
    pub fn establish_from_login(
        &self,
        response: LoginResponse,
    ) -> Result<&'static str, SessionError> {
        self.establish(&CredentialBundle::from(response))?;
        Ok(self.landing_path())
    }

    /// Rewrite the stored bundle with the provisional-password flag cleared.
    /// Call only after the identity service accepted the new password.
    /// Idempotent; a no-op when signed out or not a teacher.
    ///
    /// # Errors
    /// Returns an error if the store cannot write the updated bundle.
    pub fn clear_password_change_requirement(&self) -> Result<(), SessionError> {
        let Some(mut bundle) = self.store.load()? else {
            debug!("no session; password change flag left untouched");
            return Ok(());
        };

        if bundle.profile_mut().clear_password_change_required() {
            self.store.save(&bundle)?;
            info!(user_id = bundle.profile().id, "password change requirement cleared");
        }
        Ok(())
    }

    /// Destroy the session.
    ///
    /// # Errors
    /// Returns an error if the store cannot be cleared.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        info!("session cleared");
        Ok(())
    }

    /// Like [`Self::is_authenticated`], but destroys a stored bundle whose
    /// access token is no longer usable. There is no silent renewal.
    pub fn revalidate(&self) -> bool {
        let Some(bundle) = self.stored() else {
            return false;
        };
        if self.is_live(&bundle) {
            return true;
        }

        debug!("access token expired; clearing session");
        if let Err(err) = self.logout() {
            warn!("failed to clear expired session: {err}");
        }
        false
    }

    /// React to an unauthorized API response: drop the session and return
    /// the login path.
    ///
    /// # Errors
    /// Returns an error if the store cannot be cleared.
    pub fn handle_unauthorized(&self) -> Result<&'static str, SessionError> {
        self.logout()?;
        Ok(paths::LOGIN)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let stored = self.stored();
        let authenticated = stored.as_ref().is_some_and(|bundle| self.is_live(bundle));
        let profile = stored.as_ref().map(CredentialBundle::profile);
        let role = profile.map(Profile::role);
        let password_change_required = profile.is_some_and(Profile::password_change_required);

        SessionSnapshot {
            authenticated,
            user_id: profile.map(|p| p.id),
            email: profile.map(|p| p.email.clone()),
            role,
            password_change_required,
            landing_path: resolve_landing_path(authenticated, role, password_change_required),
        }
    }

    /// Canonical destination for the current session state.
    pub fn landing_path(&self) -> &'static str {
        self.snapshot().landing_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{clock::FixedClock, store::MemoryStore};
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde_json::json;

    const NOW: i64 = 1_750_000_000;

    fn jwt(exp: i64) -> String {
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = Base64UrlUnpadded::encode_string(
            json!({"token_type": "access", "exp": exp, "user_id": 1})
                .to_string()
                .as_bytes(),
        );
        format!("{header}.{claims}.c2ln")
    }

    fn bundle(exp: i64, user: serde_json::Value) -> CredentialBundle {
        let profile: Profile =
            serde_json::from_value(user).unwrap_or_else(|err| panic!("fixture profile: {err}"));
        CredentialBundle::new(
            SecretString::from(jwt(exp)),
            SecretString::from("refresh".to_string()),
            profile,
        )
    }

    fn teacher(flag: bool) -> serde_json::Value {
        json!({
            "id": 5,
            "email": "teacher@school.test",
            "user_type": "teacher",
            "teacher_profile": {
                "employee_id": "T-5",
                "subjects": "Science",
                "password_change_required": flag
            }
        })
    }

    fn manager() -> SessionManager<MemoryStore, FixedClock> {
        SessionManager::with_clock(MemoryStore::new(), FixedClock::new(NOW))
    }

    #[test]
    fn empty_store_is_signed_out() {
        let session = manager();
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert!(!session.requires_password_change());
        assert!(session.bearer_token().is_none());
        assert_eq!(session.landing_path(), paths::LOGIN);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn expired_token_is_not_authenticated_but_profile_remains() {
        let session = manager();
        session.establish(&bundle(NOW - 1, teacher(false))).unwrap();

        assert!(!session.is_authenticated());
        assert!(session.current_user().is_some());
        assert!(session.credentials().is_none());
        assert_eq!(session.landing_path(), paths::LOGIN);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn authentication_follows_the_clock() {
        let session = manager();
        session.establish(&bundle(NOW + 600, teacher(false))).unwrap();
        assert!(session.is_authenticated());

        session.clock().advance(600);
        assert!(!session.is_authenticated());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn undecodable_token_is_not_authenticated() {
        let session = manager();
        let profile: Profile = serde_json::from_value(teacher(false)).unwrap();
        session
            .establish(&CredentialBundle::new(
                SecretString::from("garbage".to_string()),
                SecretString::from("refresh".to_string()),
                profile,
            ))
            .unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn password_change_only_applies_to_teachers() {
        let session = manager();
        session.establish(&bundle(NOW + 60, teacher(true))).unwrap();
        assert!(session.requires_password_change());

        session
            .establish(&bundle(
                NOW + 60,
                json!({"id": 9, "email": "a@school.test", "user_type": "admin"}),
            ))
            .unwrap();
        assert!(!session.requires_password_change());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn clearing_the_flag_is_idempotent_and_preserves_the_bundle() {
        let session = manager();
        let original = bundle(NOW + 60, teacher(true));
        session.establish(&original).unwrap();

        for _ in 0..2 {
            session.clear_password_change_requirement().unwrap();
            assert!(!session.requires_password_change());

            let stored = session.store().load().unwrap().unwrap();
            assert_eq!(
                stored.access_token().expose_secret(),
                original.access_token().expose_secret()
            );
            assert_eq!(
                stored.refresh_token().expose_secret(),
                original.refresh_token().expose_secret()
            );
            assert_eq!(stored.profile().email, original.profile().email);
            assert_eq!(stored.profile().role(), Role::Teacher);
            assert_eq!(
                stored.profile().teacher_profile().map(|t| &t.employee_id),
                original.profile().teacher_profile().map(|t| &t.employee_id)
            );
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn clearing_the_flag_without_a_session_is_a_no_op() {
        let session = manager();
        session.clear_password_change_requirement().unwrap();
        assert!(session.store().load().unwrap().is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn revalidate_destroys_expired_bundles() {
        let session = manager();
        session.establish(&bundle(NOW - 10, teacher(false))).unwrap();

        assert!(!session.revalidate());
        assert!(session.store().load().unwrap().is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn revalidate_keeps_live_bundles() {
        let session = manager();
        session.establish(&bundle(NOW + 10, teacher(false))).unwrap();

        assert!(session.revalidate());
        assert!(session.store().load().unwrap().is_some());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn unauthorized_response_signs_out() {
        let session = manager();
        session.establish(&bundle(NOW + 600, teacher(false))).unwrap();

        assert_eq!(session.handle_unauthorized().unwrap(), paths::LOGIN);
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn establish_from_login_returns_landing_path() {
        let session = manager();
        let response: LoginResponse = serde_json::from_value(json!({
            "access": jwt(NOW + 3600),
            "refresh": "refresh",
            "user": teacher(true)
        }))
        .unwrap();

        assert_eq!(
            session.establish_from_login(response).unwrap(),
            paths::FORCED_PASSWORD_CHANGE
        );
        assert!(session.bearer_token().is_some());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn snapshot_has_no_token_material() {
        let session = manager();
        session.establish(&bundle(NOW + 60, teacher(false))).unwrap();

        let snapshot = session.snapshot();
        assert!(snapshot.authenticated);
        assert_eq!(snapshot.role, Some(Role::Teacher));
        assert_eq!(snapshot.landing_path, paths::TEACHER_DASHBOARD);

        let rendered = serde_json::to_string(&snapshot).unwrap();
        assert!(!rendered.contains("refresh"));
        assert!(!rendered.contains(&jwt(NOW + 60)));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn logout_clears_everything() {
        let session = manager();
        session.establish(&bundle(NOW + 60, teacher(false))).unwrap();
        session.logout().unwrap();

        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert!(session.role().is_none());
    }
}
