use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::env;

use crate::utils::cookies::CookieOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub supabase_url: String,
    #[serde(skip_serializing)]
    pub supabase_anon_key: String,
    #[serde(skip_serializing)]
    pub supabase_service_key: String,
    /// Origins allowed by CORS; the first entry also serves as the default
    /// redirect base for confirmation and recovery e-mails.
    pub frontend_origins: Vec<String>,
    pub production: bool,
    pub port: u16,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let supabase_url =
            env::var("SUPABASE_URL").map_err(|_| anyhow!("SUPABASE_URL must be set"))?;
        let supabase_anon_key =
            env::var("SUPABASE_ANON_KEY").map_err(|_| anyhow!("SUPABASE_ANON_KEY must be set"))?;
        let supabase_service_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| anyhow!("SUPABASE_SERVICE_ROLE_KEY must be set"))?;

        let frontend_origins: Vec<String> = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        if frontend_origins.is_empty() {
            return Err(anyhow!("FRONTEND_ORIGINS must list at least one origin"));
        }

        let production = env::var("APP_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .unwrap_or(8000);

        Ok(Config {
            supabase_url,
            supabase_anon_key,
            supabase_service_key,
            frontend_origins,
            production,
            port,
        })
    }

    /// Cookie attributes for the current environment: `Secure` + `SameSite=None`
    /// in production (cross-site frontend), `SameSite=Lax` in development.
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions::for_environment(self.production)
    }

    /// Default base for e-mail redirect links.
    pub fn frontend_url(&self) -> &str {
        &self.frontend_origins[0]
    }
}
