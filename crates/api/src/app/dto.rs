use serde::Deserialize;

use messagely_auth::Registration;
use messagely_core::Profile;

// -------------------------
// Request DTOs
// -------------------------

/// Missing fields deserialize as empty so the issuer reports them uniformly.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Registration {
            username: req.username,
            password: req.password,
            profile: Profile {
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateMessageRequest {
    pub to_username: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_become_empty() {
        let req: LoginRequest = serde_json::from_str(r#"{"username":"bob"}"#).unwrap();
        assert_eq!(req.username, "bob");
        assert!(req.password.is_empty());
    }

    #[test]
    fn token_field_is_ignored() {
        let req: CreateMessageRequest =
            serde_json::from_str(r#"{"_token":"t","to_username":"carol","body":"hi"}"#).unwrap();
        assert_eq!(req.to_username, "carol");
        assert_eq!(req.body, "hi");
    }
}
