use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL used when generating short links, e.g. "https://go.example.com"
    /// Must NOT have a trailing slash.
    pub base_url: String,

    /// Origin allowed to call the API from a browser.
    pub cors_origin: String,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let frontend_url = lookup("FRONTEND_URL").map(|u| u.trim_end_matches('/').to_owned());

        // BASE_URL wins; FRONTEND_URL is what the web client serves codes under.
        let base_url = lookup("BASE_URL")
            .or_else(|| frontend_url.clone())
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            anyhow::bail!("BASE_URL must start with http:// or https://, got '{base_url}'");
        }

        let cors_origin = lookup("CORS_ORIGIN")
            .or(frontend_url)
            .unwrap_or_else(|| "http://localhost:3001".into())
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            base_url,
            cors_origin,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public short URL for `short_code`.
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }
}
