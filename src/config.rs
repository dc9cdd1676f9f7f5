use std::env;

/// Process configuration, read from the environment once at startup and
/// injected into every component. Nothing below `main` touches `env::var`
/// for pipeline behavior.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub body_limit: usize,
    pub http: HttpConfig,
    pub llm: LlmConfig,
    pub marketplace: MarketplaceConfig,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub gateway_url: String,
    pub api_key: Option<String>,
    pub function_name: Option<String>,
    pub model: Option<String>,
}

/// Credentials and endpoints for the configured marketplace. Credentials may
/// be blank here; the token exchange checks them eagerly and fails without
/// I/O when they are missing.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub marketplace_id: String,
    pub token_url: String,
    pub api_root: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_env("PORT").unwrap_or(8000),
            // Submissions carry base64-encoded photos, so the default is far
            // above a typical JSON body cap.
            body_limit: parse_env("REQUEST_MAX_BYTES")
                .filter(|v| *v > 0)
                .unwrap_or(20 * 1024 * 1024),
            http: HttpConfig {
                timeout_secs: parse_env("HTTP_TIMEOUT_SECS").unwrap_or(15),
                connect_timeout_secs: parse_env("HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(5),
            },
            llm: LlmConfig::from_env(),
            marketplace: MarketplaceConfig::from_env(),
            smtp: SmtpConfig::from_env(),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gateway_url: env::var("LLM_GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            api_key: env::var("LLM_API_KEY").ok(),
            function_name: env::var("LLM_FUNCTION").ok(),
            model: env::var("LLM_MODEL").ok(),
        }
    }
}

impl MarketplaceConfig {
    pub fn from_env() -> Self {
        let environment = env::var("MARKETPLACE_ENV").unwrap_or_else(|_| "SANDBOX".into());
        let default_root = if environment.eq_ignore_ascii_case("PROD") {
            "https://api.ebay.com"
        } else {
            "https://api.sandbox.ebay.com"
        };
        let api_root = env::var("MARKETPLACE_API_URL")
            .unwrap_or_else(|_| default_root.to_string())
            .trim_end_matches('/')
            .to_string();
        let token_url = env::var("MARKETPLACE_TOKEN_URL")
            .unwrap_or_else(|_| format!("{api_root}/identity/v1/oauth2/token"));

        Self {
            client_id: env::var("MARKETPLACE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("MARKETPLACE_CLIENT_SECRET").unwrap_or_default(),
            refresh_token: env::var("MARKETPLACE_REFRESH_TOKEN").unwrap_or_default(),
            marketplace_id: env::var("MARKETPLACE_ID").unwrap_or_else(|_| "EBAY_US".into()),
            token_url,
            api_root,
        }
    }
}

impl SmtpConfig {
    /// `None` unless SMTP_HOST is set; the notification sink treats an
    /// absent config as a logged no-op.
    pub fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok().filter(|v| !v.trim().is_empty())?;
        let username = env::var("SMTP_USERNAME").ok();
        let from = env::var("SMTP_FROM")
            .ok()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "listings@localhost".into());
        Some(Self {
            host,
            port: parse_env("SMTP_PORT").unwrap_or(587),
            username,
            password: env::var("SMTP_PASSWORD").ok(),
            from,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
