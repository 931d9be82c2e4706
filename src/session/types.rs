//! Credential bundle and profile types. The bundle carries bearer material, so
//! tokens are held as `SecretString` and the bundle never derives `Serialize`;
//! persistence goes through the store document instead.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role as reported by the identity service (`user_type` on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Teacher,
    Admin,
    /// Any role value this client does not know; routed like a parent.
    #[serde(other)]
    Unknown,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// Teacher-only profile data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub subjects: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Set when the account was provisioned with a temporary password.
    #[serde(default)]
    pub password_change_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    SuperAdmin,
    Admin,
    Moderator,
}

/// Admin-only profile data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub admin_level: AdminLevel,
    #[serde(default)]
    pub permissions: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Role-specific part of the profile, tagged by `user_type`.
///
/// A teacher always carries a [`TeacherProfile`]; a payload that claims
/// `teacher` without one fails to decode and is treated as no session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "snake_case")]
pub enum RoleProfile {
    Parent,
    Teacher {
        teacher_profile: TeacherProfile,
    },
    Admin {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        admin_profile: Option<AdminProfile>,
    },
    #[serde(other)]
    Unknown,
}

/// Denormalized user record issued with the tokens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
    #[serde(flatten)]
    pub account: RoleProfile,
}

impl Profile {
    #[must_use]
    pub fn role(&self) -> Role {
        match self.account {
            RoleProfile::Parent => Role::Parent,
            RoleProfile::Teacher { .. } => Role::Teacher,
            RoleProfile::Admin { .. } => Role::Admin,
            RoleProfile::Unknown => Role::Unknown,
        }
    }

    #[must_use]
    pub fn teacher_profile(&self) -> Option<&TeacherProfile> {
        match &self.account {
            RoleProfile::Teacher { teacher_profile } => Some(teacher_profile),
            _ => None,
        }
    }

    /// True only for teachers still holding a provisional password.
    #[must_use]
    pub fn password_change_required(&self) -> bool {
        self.teacher_profile()
            .is_some_and(|teacher| teacher.password_change_required)
    }

    /// Clears the provisional-password flag. Returns `true` if it was set.
    pub(crate) fn clear_password_change_required(&mut self) -> bool {
        match &mut self.account {
            RoleProfile::Teacher { teacher_profile } if teacher_profile.password_change_required => {
                teacher_profile.password_change_required = false;
                true
            }
            _ => false,
        }
    }
}

/// The unit of session state: both tokens plus the profile they were issued for.
#[derive(Clone, Debug)]
pub struct CredentialBundle {
    access_token: SecretString,
    refresh_token: SecretString,
    profile: Profile,
}

impl CredentialBundle {
    #[must_use]
    pub fn new(access_token: SecretString, refresh_token: SecretString, profile: Profile) -> Self {
        Self {
            access_token,
            refresh_token,
            profile,
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub(crate) fn profile_mut(&mut self) -> &mut Profile {
        &mut self.profile
    }
}

/// Response body of a successful login or auto-authenticating email
/// verification. Must never be logged.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: Profile,
}

impl From<LoginResponse> for CredentialBundle {
    fn from(response: LoginResponse) -> Self {
        Self::new(
            SecretString::from(response.access),
            SecretString::from(response.refresh),
            response.user,
        )
    }
}
