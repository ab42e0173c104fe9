use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, error::ApiError, state::AppState};

/// Signing/verification material for both token kinds. Access and refresh
/// tokens use distinct secrets, so presenting one where the other is
/// expected fails signature verification.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(cfg.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(cfg.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs((cfg.access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_hours as u64) * 3600),
        }
    }

    fn sign(
        &self,
        key: &EncodingKey,
        ttl: Duration,
        user_id: i64,
        email: &str,
    ) -> Result<String, ApiError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, key).map_err(ApiError::Signing)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: i64, email: &str) -> Result<String, ApiError> {
        self.sign(&self.access_encoding, self.access_ttl, user_id, email)
    }

    pub fn sign_refresh(&self, user_id: i64, email: &str) -> Result<String, ApiError> {
        self.sign(&self.refresh_encoding, self.refresh_ttl, user_id, email)
    }

    /// Issues a fresh access+refresh pair; refresh always rotates both.
    pub fn sign_pair(&self, user_id: i64, email: &str) -> Result<(String, String), ApiError> {
        Ok((
            self.sign_access(user_id, email)?,
            self.sign_refresh(user_id, email)?,
        ))
    }

    fn verify(key: &DecodingKey, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::ExpiredToken,
            _ => ApiError::InvalidToken,
        })?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, ApiError> {
        Self::verify(&self.access_decoding, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, ApiError> {
        Self::verify(&self.refresh_decoding, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            access_secret: "test-access-secret".into(),
            refresh_secret: "test-refresh-secret".into(),
            access_ttl_minutes: 15,
            refresh_ttl_hours: 72,
        })
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(7, "a@b.com").expect("sign access");
        let claims = keys.verify_access(&token).expect("verify access");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "a@b.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let token = keys.sign_refresh(7, "a@b.com").expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.sub, 7);
    }

    #[test]
    fn refresh_token_is_rejected_as_access_token() {
        let keys = make_keys();
        let token = keys.sign_refresh(7, "a@b.com").expect("sign refresh");
        let err = keys.verify_access(&token).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn access_token_is_rejected_as_refresh_token() {
        let keys = make_keys();
        let token = keys.sign_access(7, "a@b.com").expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let keys = make_keys();
        let mut token = keys.sign_access(7, "a@b.com").expect("sign access");
        token.push('x');
        let err = keys.verify_access(&token).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let keys = make_keys();
        let err = keys.verify_access("not.a.jwt").unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = make_keys();
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let claims = Claims {
            sub: 7,
            email: "a@b.com".into(),
            iat: (past - TimeDuration::minutes(15)).unix_timestamp() as usize,
            exp: past.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.access_encoding).unwrap();
        let err = keys.verify_access(&token).unwrap_err();
        assert!(matches!(err, ApiError::ExpiredToken));
    }

    #[test]
    fn refresh_ttl_is_longer_than_access_ttl() {
        let keys = make_keys();
        let access = keys.sign_access(1, "a@b.com").unwrap();
        let refresh = keys.sign_refresh(1, "a@b.com").unwrap();
        let a = keys.verify_access(&access).unwrap();
        let r = keys.verify_refresh(&refresh).unwrap();
        assert!(r.exp > a.exp);
    }
}
