pub mod session;

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Store a bundle read from a file, or stdin for `-`.
    Login { response: String },
    Status,
    Landing,
    Open { path: String },
    PasswordChanged,
    Unauthorized,
    Logout,
}
