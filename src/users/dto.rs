use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description};

use crate::users::repo_types::User;

/// Request body for registration. `profile_image` may carry a
/// `data:<mime>;base64,` payload to store as the avatar.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// PATCH body for self-service update. Omitted fields keep their prior
/// values (partial merge).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
}

/// Sanitized user view: never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Registration response: sanitized user plus the initial token pair.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image: user.profile_image.clone(),
            created_at: user.created_at.format(TIMESTAMP_FORMAT).unwrap_or_default(),
            updated_at: user.updated_at.format(TIMESTAMP_FORMAT).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "a@b.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            profile_image: None,
            created_at: datetime!(2024-05-01 12:30:45 UTC),
            updated_at: datetime!(2024-05-02 08:00:00 UTC),
        }
    }

    #[test]
    fn response_never_carries_password_hash() {
        let resp = UserResponse::from(&sample_user());
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.com");
    }

    #[test]
    fn user_record_serialization_skips_hash_too() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn timestamps_are_formatted() {
        let resp = UserResponse::from(&sample_user());
        assert_eq!(resp.created_at, "2024-05-01 12:30:45");
        assert_eq!(resp.updated_at, "2024-05-02 08:00:00");
    }

    #[test]
    fn update_request_fields_are_optional() {
        let req: UpdateMeRequest = serde_json::from_str(r#"{"first_name":"New"}"#).unwrap();
        assert_eq!(req.first_name.as_deref(), Some("New"));
        assert!(req.email.is_none());
        assert!(req.profile_image.is_none());
    }
}
