use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// The one identifier granted the administrator role.
    pub admin_email: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let admin_email = std::env::var("ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@example.com".into())
            .trim()
            .to_lowercase();
        Ok(Self {
            database_url,
            admin_email,
        })
    }
}
