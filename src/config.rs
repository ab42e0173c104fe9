use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub media_dir: String,
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            access_secret: std::env::var("JWT_ACCESS_SECRET")?,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET")?,
            access_ttl_minutes: std::env::var("JWT_ACCESS_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_hours: std::env::var("JWT_REFRESH_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(72),
        };
        anyhow::ensure!(
            !jwt.access_secret.is_empty(),
            "JWT_ACCESS_SECRET must not be empty"
        );
        anyhow::ensure!(
            !jwt.refresh_secret.is_empty(),
            "JWT_REFRESH_SECRET must not be empty"
        );
        // Token kinds are told apart by which secret signed them, so the
        // secrets must actually differ.
        anyhow::ensure!(
            jwt.access_secret != jwt.refresh_secret,
            "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ"
        );
        let media_dir = std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./media/avatars".into());
        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        Ok(Self {
            database_url,
            jwt,
            media_dir,
            public_base_url,
        })
    }
}
