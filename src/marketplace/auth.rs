use crate::config::MarketplaceConfig;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

pub const TOKEN_SCOPES: &[&str] = &["https://api.ebay.com/oauth/api_scope/sell.inventory"];

#[derive(Debug, Error)]
pub enum MarketplaceAuthError {
    #[error("marketplace credentials are not configured")]
    MissingCredentials,
    #[error("token request failed: {0}")]
    Request(String),
    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("token response missing access_token")]
    MissingAccessToken,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchanges the configured refresh token for a short-lived access token.
/// Credentials are checked before any request goes out; the returned token
/// is valid for a single publish attempt and is never cached.
pub async fn acquire_access_token(
    http: &Client,
    config: &MarketplaceConfig,
) -> Result<String, MarketplaceAuthError> {
    if config.client_id.trim().is_empty()
        || config.client_secret.trim().is_empty()
        || config.refresh_token.trim().is_empty()
    {
        return Err(MarketplaceAuthError::MissingCredentials);
    }

    let scope = TOKEN_SCOPES.join(" ");
    let body = [
        ("grant_type", "refresh_token"),
        ("refresh_token", config.refresh_token.as_str()),
        ("scope", scope.as_str()),
    ];

    let response = http
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&body)
        .send()
        .await
        .map_err(|err| MarketplaceAuthError::Request(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MarketplaceAuthError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let payload: TokenResponse = response
        .json()
        .await
        .map_err(|err| MarketplaceAuthError::Request(err.to_string()))?;

    match payload.access_token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(MarketplaceAuthError::MissingAccessToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(token_url: &str) -> MarketplaceConfig {
        MarketplaceConfig {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            refresh_token: "refresh-token".into(),
            marketplace_id: "EBAY_US".into(),
            token_url: token_url.to_string(),
            api_root: "http://127.0.0.1:9".into(),
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        // The endpoint is unreachable on purpose; a transport error here
        // would mean a request was attempted.
        let mut cfg = config("http://127.0.0.1:9/identity/v1/oauth2/token");
        cfg.refresh_token = String::new();
        let err = acquire_access_token(&Client::new(), &cfg)
            .await
            .expect_err("must fail");
        assert!(matches!(err, MarketplaceAuthError::MissingCredentials));

        let mut cfg = config("http://127.0.0.1:9/identity/v1/oauth2/token");
        cfg.client_secret = "   ".into();
        let err = acquire_access_token(&Client::new(), &cfg)
            .await
            .expect_err("must fail");
        assert!(matches!(err, MarketplaceAuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn refresh_grant_returns_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v1/oauth2/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-abc",
                "expires_in": 7200
            })))
            .mount(&server)
            .await;

        let cfg = config(&format!("{}/identity/v1/oauth2/token", server.uri()));
        let token = acquire_access_token(&Client::new(), &cfg)
            .await
            .expect("token");
        assert_eq!(token, "tok-abc");
    }

    #[tokio::test]
    async fn error_status_carries_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let cfg = config(&format!("{}/identity/v1/oauth2/token", server.uri()));
        let err = acquire_access_token(&Client::new(), &cfg)
            .await
            .expect_err("must fail");
        match err {
            MarketplaceAuthError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid_grant");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_access_token_field_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expires_in": 7200})))
            .mount(&server)
            .await;

        let cfg = config(&format!("{}/identity/v1/oauth2/token", server.uri()));
        let err = acquire_access_token(&Client::new(), &cfg)
            .await
            .expect_err("must fail");
        assert!(matches!(err, MarketplaceAuthError::MissingAccessToken));
    }
}
