use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub frontend_dir: String,
    pub cors_origin: String,
    pub cookie_secure: bool,
    /// Base URL used when building links in outgoing email.
    pub public_url: String,
    pub upload_dir: String,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub mail_from: String,
    pub seed_demo_user: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();

        Ok(Self {
            port: match std::env::var("PORT") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.port,
            },
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            frontend_dir: std::env::var("FRONTEND_DIR").unwrap_or(defaults.frontend_dir),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            cookie_secure: env_flag("COOKIE_SECURE").unwrap_or(defaults.cookie_secure),
            public_url: std::env::var("PUBLIC_URL").unwrap_or(defaults.public_url),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            resend_api_key: std::env::var("RESEND_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            resend_api_url: std::env::var("RESEND_API_URL").unwrap_or(defaults.resend_api_url),
            mail_from: std::env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            seed_demo_user: env_flag("SEED_DEMO_USER").unwrap_or(defaults.seed_demo_user),
        })
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21547,
            database_url: "sqlite:teamflow.db".into(),
            frontend_dir: "../frontend/dist".into(),
            cors_origin: "http://localhost:3000,http://127.0.0.1:3000".into(),
            cookie_secure: false,
            public_url: "http://localhost:3000".into(),
            upload_dir: "uploads".into(),
            resend_api_key: None,
            resend_api_url: "https://api.resend.com/emails".into(),
            mail_from: "TeamFlow <noreply@teamflow.local>".into(),
            seed_demo_user: false,
        }
    }
}
