use serde::{de, Deserialize, Deserializer, Serialize};

/// JWT payload. Access and refresh tokens share this shape; which kind a
/// token is follows from the secret that signed it, not from a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "de_user_id")]
    pub sub: i64, // user ID
    pub email: String,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}

// Largest integer a JSON float carries exactly.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0; // 2^53

/// Some token producers write the id claim as a float. Accept that only
/// while the conversion is lossless; ids past 2^53 would silently corrupt,
/// so they are rejected as invalid instead.
fn de_user_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let n = serde_json::Number::deserialize(d)?;
    if let Some(v) = n.as_i64() {
        return Ok(v);
    }
    if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.abs() < MAX_EXACT_F64 {
            return Ok(f as i64);
        }
    }
    Err(de::Error::custom("id claim is not an exact integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_id_decodes() {
        let claims: Claims = serde_json::from_value(json!({
            "sub": 42, "email": "a@b.com", "iat": 1, "exp": 2
        }))
        .unwrap();
        assert_eq!(claims.sub, 42);
    }

    #[test]
    fn float_id_decodes_when_exact() {
        let claims: Claims = serde_json::from_value(json!({
            "sub": 42.0, "email": "a@b.com", "iat": 1, "exp": 2
        }))
        .unwrap();
        assert_eq!(claims.sub, 42);
    }

    #[test]
    fn fractional_id_is_rejected() {
        let res: Result<Claims, _> = serde_json::from_value(json!({
            "sub": 42.5, "email": "a@b.com", "iat": 1, "exp": 2
        }));
        assert!(res.is_err());
    }

    #[test]
    fn oversized_float_id_is_rejected() {
        let res: Result<Claims, _> = serde_json::from_value(json!({
            "sub": 1.0e17, "email": "a@b.com", "iat": 1, "exp": 2
        }));
        assert!(res.is_err());
    }

    #[test]
    fn missing_email_is_rejected() {
        let res: Result<Claims, _> = serde_json::from_value(json!({
            "sub": 1, "iat": 1, "exp": 2
        }));
        assert!(res.is_err());
    }
}
