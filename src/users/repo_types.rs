use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, never exposed in JSON
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>, // public URL, if an avatar was uploaded
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
