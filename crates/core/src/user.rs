//! User profile records (public projections of a stored credential).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Username;

/// Profile fields supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Basic info on a user, safe to hand to any authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl UserProfile {
    pub fn new(username: Username, profile: Profile) -> Self {
        Self {
            username,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
        }
    }
}

/// Full profile, including account timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub join_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}
