//! Session state: the credential bundle, where it is stored, and how its
//! usability is judged. Token and profile data cross security boundaries here;
//! nothing in this module logs token material.

pub mod clock;
pub mod manager;
pub mod store;
pub mod token;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use manager::{SessionError, SessionManager, SessionSnapshot};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
pub use token::{expires_at, is_expired, is_expired_at, TokenError};
pub use types::{
    AdminLevel, AdminProfile, CredentialBundle, LoginResponse, Profile, Role, RoleProfile,
    TeacherProfile,
};
