use sqlx::PgPool;

use crate::error::ApiError;
use crate::users::repo_types::User;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, profile_image, created_at, updated_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list(db: &PgPool) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Inserts a new user. The unique constraint on email is the duplicate
    /// arbiter; a violation surfaces as `DuplicateAccount`.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        profile_image: Option<&str>,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, profile_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(profile_image)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Persists profile fields of an existing record. The password hash is
    /// not touched here.
    pub async fn save(&self, db: &PgPool) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, profile_image = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.email)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.profile_image)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::AccountNotFound);
        }
        Ok(())
    }
}
