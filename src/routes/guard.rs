//! Route admission for protected views.
//!
//! Flow Overview: every mount or navigation puts the guard in `Checking` and
//! hands out an [`Evaluation`] ticket. The check revalidates the session
//! (destroying an expired bundle), optionally awaits a [`Revalidator`], and
//! then decides `Admitted` or `Denied`. A ticket from a superseded navigation
//! or an unmounted view is discarded on completion.
//!
//! UX-only gate: the API still enforces access on every call.

use crate::routes::landing::{paths, resolve_landing_path};
use crate::session::{
    clock::Clock,
    manager::SessionManager,
    store::SessionStore,
    types::{CredentialBundle, Profile, Role},
};
use serde::Serialize;
use std::future::{self, Future};
use tracing::{debug, instrument, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    Unauthenticated,
    WrongRole,
}

/// Guard state for one evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Admission {
    Checking,
    Admitted,
    Denied {
        reason: DenyReason,
        target: &'static str,
    },
}

impl Admission {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Checking)
    }

    const fn unauthenticated() -> Self {
        Self::Denied {
            reason: DenyReason::Unauthenticated,
            target: paths::LOGIN,
        }
    }
}

/// A view behind the guard. Without a required role only authentication is
/// checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedView {
    path: String,
    required_role: Option<Role>,
}

impl ProtectedView {
    pub fn new(path: impl Into<String>, required_role: Option<Role>) -> Self {
        Self {
            path: path.into(),
            required_role,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn required_role(&self) -> Option<Role> {
        self.required_role
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revalidation {
    Accepted,
    Rejected,
}

/// Optional asynchronous confirmation of a locally valid session, e.g. a
/// server-side token check. Renewal, if ever added, lives behind this seam.
pub trait Revalidator: Send + Sync {
    fn confirm(&self, bundle: &CredentialBundle) -> impl Future<Output = Revalidation> + Send;
}

/// Trusts the local expiry check alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalOnly;

impl Revalidator for LocalOnly {
    fn confirm(&self, _bundle: &CredentialBundle) -> impl Future<Output = Revalidation> + Send {
        future::ready(Revalidation::Accepted)
    }
}

/// Role rules for an authenticated profile. An unknown role is admitted
/// where a parent would be, matching where it lands.
fn decide(view: &ProtectedView, profile: &Profile) -> Admission {
    let Some(required) = view.required_role else {
        return Admission::Admitted;
    };

    let role = profile.role();
    let pending = profile.password_change_required();
    let role_matches = role == required || (role == Role::Unknown && required == Role::Parent);
    let blocked_by_password_change = pending && view.path != paths::FORCED_PASSWORD_CHANGE;

    if role_matches && !blocked_by_password_change {
        Admission::Admitted
    } else {
        Admission::Denied {
            reason: DenyReason::WrongRole,
            target: resolve_landing_path(true, Some(role), pending),
        }
    }
}

/// Run the check for `view`. This is the suspension point of an evaluation.
#[instrument(skip_all, fields(path = %view.path))]
pub async fn check_admission<S, C, R>(
    view: &ProtectedView,
    session: &SessionManager<S, C>,
    revalidator: &R,
) -> Admission
where
    S: SessionStore,
    C: Clock,
    R: Revalidator,
{
    if !session.revalidate() {
        return Admission::unauthenticated();
    }
    let Some(bundle) = session.credentials() else {
        return Admission::unauthenticated();
    };

    if revalidator.confirm(&bundle).await == Revalidation::Rejected {
        debug!("session rejected by revalidator");
        if let Err(err) = session.logout() {
            warn!("failed to clear rejected session: {err}");
        }
        return Admission::unauthenticated();
    }

    decide(view, bundle.profile())
}

/// Ticket identifying one evaluation of a [`RouteGuard`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    generation: u64,
}

/// Three-state admission machine for one protected view instance.
#[derive(Debug)]
pub struct RouteGuard {
    view: ProtectedView,
    state: Admission,
    generation: u64,
    mounted: bool,
}

impl RouteGuard {
    #[must_use]
    pub fn new(view: ProtectedView) -> Self {
        Self {
            view,
            state: Admission::Checking,
            generation: 0,
            mounted: false,
        }
    }

    #[must_use]
    pub fn view(&self) -> &ProtectedView {
        &self.view
    }

    #[must_use]
    pub fn state(&self) -> &Admission {
        &self.state
    }

    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// Enter `Checking` for a fresh mount or navigation. Any earlier verdict is
    /// forgotten and earlier tickets become stale.
    pub fn begin(&mut self) -> Evaluation {
        self.generation += 1;
        self.mounted = true;
        self.state = Admission::Checking;
        debug!(path = %self.view.path, generation = self.generation, "admission check started");
        Evaluation {
            generation: self.generation,
        }
    }

    /// Point the guard at a different view and start checking it.
    pub fn navigate(&mut self, view: ProtectedView) -> Evaluation {
        self.view = view;
        self.begin()
    }

    /// Stop accepting results; pending evaluations become stale.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.generation += 1;
    }

    /// Apply the outcome of `evaluation`. Returns `false` (state untouched) if
    /// the ticket is stale, the view is unmounted, the evaluation already
    /// finished, or `outcome` is not terminal.
    pub fn complete(&mut self, evaluation: Evaluation, outcome: Admission) -> bool {
        if !self.mounted || evaluation.generation != self.generation {
            warn!(
                path = %self.view.path,
                stale = evaluation.generation,
                current = self.generation,
                "discarding stale admission result"
            );
            return false;
        }
        if self.state.is_terminal() || !outcome.is_terminal() {
            return false;
        }

        debug!(path = %self.view.path, ?outcome, "admission check finished");
        self.state = outcome;
        true
    }

    /// Begin, check and complete in one step.
    pub async fn evaluate<S, C, R>(
        &mut self,
        session: &SessionManager<S, C>,
        revalidator: &R,
    ) -> &Admission
    where
        S: SessionStore,
        C: Clock,
        R: Revalidator,
    {
        let evaluation = self.begin();
        let outcome = check_admission(&self.view, session, revalidator).await;
        self.complete(evaluation, outcome);
        &self.state
    }
}

/// What a protected view shows for the current guard state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewOutcome {
    Loading,
    Render,
    Redirect(&'static str),
}

/// Performs client-side navigation.
pub trait Navigator {
    /// Navigate to `path`, replacing the current history entry.
    fn replace(&self, path: &str);
}

/// Protected-view wrapper: renders the content once admitted, a loading
/// affordance while checking, or carries out the guard's redirect.
#[derive(Debug)]
pub struct ProtectedRoute {
    guard: RouteGuard,
    redirected: Option<u64>,
}

impl ProtectedRoute {
    pub fn new(path: impl Into<String>, required_role: Option<Role>) -> Self {
        Self::from_view(ProtectedView::new(path, required_role))
    }

    #[must_use]
    pub fn from_view(view: ProtectedView) -> Self {
        Self {
            guard: RouteGuard::new(view),
            redirected: None,
        }
    }

    #[must_use]
    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut RouteGuard {
        &mut self.guard
    }

    #[must_use]
    pub fn outcome(&self) -> ViewOutcome {
        match self.guard.state() {
            Admission::Checking => ViewOutcome::Loading,
            Admission::Admitted => ViewOutcome::Render,
            Admission::Denied { target, .. } => ViewOutcome::Redirect(target),
        }
    }

    /// Evaluate the guard for a mount and return what to show.
    pub async fn mount<S, C, R>(
        &mut self,
        session: &SessionManager<S, C>,
        revalidator: &R,
    ) -> ViewOutcome
    where
        S: SessionStore,
        C: Clock,
        R: Revalidator,
    {
        self.guard.evaluate(session, revalidator).await;
        self.outcome()
    }

    /// Carry out a decided redirect, at most once per evaluation.
    pub fn settle<N: Navigator + ?Sized>(&mut self, navigator: &N) -> ViewOutcome {
        let outcome = self.outcome();
        if let ViewOutcome::Redirect(target) = outcome {
            let generation = self.guard.generation();
            if self.redirected != Some(generation) {
                navigator.replace(target);
                self.redirected = Some(generation);
            }
        }
        outcome
    }
}
