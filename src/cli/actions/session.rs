use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::routes::{entry_decision, Admission, EntryDecision, LocalOnly, ProtectedRoute};
use crate::session::{FileStore, LoginResponse, SessionManager, SessionStore};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::{fs, io};
use tracing::debug;

#[derive(Debug, Serialize)]
struct OpenReport<'a> {
    path: &'a str,
    decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admission: Option<Admission>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_response(source: &str) -> Result<LoginResponse> {
    let raw = if source == "-" {
        io::read_to_string(io::stdin()).context("Failed to read login response from stdin")?
    } else {
        fs::read_to_string(source)
            .with_context(|| format!("Failed to read login response: {source}"))?
    };

    serde_json::from_str(&raw).context("Login response is not a valid credential bundle")
}

async fn open<S: SessionStore>(path: &str, session: &SessionManager<S>) -> Result<()> {
    let report = match entry_decision(path, session) {
        EntryDecision::Render => OpenReport {
            path,
            decision: "render",
            target: None,
            admission: None,
        },
        EntryDecision::Redirect(target) => OpenReport {
            path,
            decision: "redirect",
            target: Some(target),
            admission: None,
        },
        EntryDecision::Guard(view) => {
            let mut route = ProtectedRoute::from_view(view);
            route.mount(session, &LocalOnly).await;
            let admission = route.guard().state().clone();
            let target = match &admission {
                Admission::Denied { target, .. } => Some(*target),
                Admission::Checking | Admission::Admitted => None,
            };
            OpenReport {
                path,
                decision: if target.is_some() { "redirect" } else { "render" },
                target,
                admission: Some(admission),
            }
        }
    };

    print_json(&report)
}

/// Execute a session action against the store named in `globals`.
///
/// # Errors
/// Returns an error if the login response cannot be read or the store cannot
/// be written.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let store = FileStore::new(&globals.store_path);
    debug!(store = %store.path().display(), ?action, "running session action");
    let session = SessionManager::new(store);

    match action {
        Action::Login { response } => {
            let response = read_response(&response)?;
            let landing_path = session
                .establish_from_login(response)
                .context("Failed to store session")?;
            print_json(&json!({ "landing_path": landing_path }))?;
        }
        Action::Status => print_json(&session.snapshot())?,
        Action::Landing => println!("{}", session.landing_path()),
        Action::Open { path } => open(&path, &session).await?,
        Action::PasswordChanged => {
            session
                .clear_password_change_requirement()
                .context("Failed to update session")?;
            print_json(&json!({ "landing_path": session.landing_path() }))?;
        }
        Action::Unauthorized => {
            let target = session
                .handle_unauthorized()
                .context("Failed to clear session")?;
            print_json(&json!({ "landing_path": target }))?;
        }
        Action::Logout => {
            session.logout().context("Failed to clear session")?;
            print_json(&json!({ "landing_path": session.landing_path() }))?;
        }
    }

    Ok(())
}
