use chrono::{DateTime, Utc};

use messagely_core::{Profile, UserDetail, UserProfile, Username};

/// A credential about to be stored (registration input, already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub username: Username,
    pub password_hash: String,
    pub profile: Profile,
    pub joined_at: DateTime<Utc>,
}

/// A stored credential.
///
/// The digest is written once at registration and never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: Username,
    pub password_hash: String,
    pub profile: Profile,
    pub joined_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn from_new(new: NewCredential) -> Self {
        Self {
            username: new.username,
            password_hash: new.password_hash,
            profile: new.profile,
            joined_at: new.joined_at,
            last_login_at: None,
        }
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile::new(self.username.clone(), self.profile.clone())
    }

    pub fn to_detail(&self) -> UserDetail {
        UserDetail {
            profile: self.to_profile(),
            join_at: self.joined_at,
            last_login_at: self.last_login_at,
        }
    }
}
