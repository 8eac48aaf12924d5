use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Principal role, also the kind discriminator for login identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Customer account created through registration
    User,
    /// Back-office administrator provisioned from configuration
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional profile fields carried by customer accounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub mob_num: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
}

/// A user or admin as held by the credential store
#[derive(Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub display_name: String,
    pub login_identifier: String,
    pub password_hash: String,
    #[serde(default)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Create a new principal with a fresh identifier.
    /// `password_hash` must already be a PHC hash string.
    pub fn new(
        role: Role,
        display_name: String,
        login_identifier: String,
        password_hash: String,
        profile: Profile,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            display_name,
            login_identifier,
            password_hash,
            profile,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Keeps the hash out of log lines.
impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .field("login_identifier", &self.login_identifier)
            .field("password_hash", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Input to the registration flow
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub display_name: String,
    pub login_identifier: String,
    pub password: String,
    pub profile: Profile,
}
