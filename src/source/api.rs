//! Heartbeat read from the monitored API
//!
//! Two requests per observation: a guest token exchange against the OAuth
//! endpoint, then the settings endpoint whose `data.heartbeat_date` is the
//! heartbeat marker.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{ObservationSource, SourceError};
use crate::config::MonitorConfig;

/// Observation source backed by the store-front API
#[derive(Debug, Clone)]
pub struct ApiSource {
    http_client: reqwest::Client,
    base_url: String,
    oauth_endpoint: String,
    settings_endpoint: String,
    credentials: GuestCredentials,
}

#[derive(Debug, Clone)]
struct GuestCredentials {
    client_id: String,
    client_secret: String,
    scope: String,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    scope: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ApiSource {
    pub fn new(config: &MonitorConfig) -> Result<Self, SourceError> {
        Self::with_timeout(config, config.http_timeout)
    }

    pub fn with_timeout(config: &MonitorConfig, timeout: Duration) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            oauth_endpoint: config.oauth_endpoint.clone(),
            settings_endpoint: config.settings_endpoint.clone(),
            credentials: GuestCredentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                scope: config.scope.clone(),
            },
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Exchange the client credentials for a guest access token
    pub async fn fetch_token(&self) -> Result<String, SourceError> {
        let url = self.url(&self.oauth_endpoint);
        let request = TokenRequest {
            grant_type: "guest",
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            scope: &self.credentials.scope,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let response = check_status(&self.oauth_endpoint, response).await?;

        let token: TokenResponse = response.json().await.map_err(|e| SourceError::Malformed {
            endpoint: self.oauth_endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(token.access_token)
    }

    /// Read the heartbeat marker using a previously fetched token
    pub async fn fetch_heartbeat(&self, token: &str) -> Result<String, SourceError> {
        let url = self.url(&self.settings_endpoint);

        let response = self
            .http_client
            .get(&url)
            .query(&[("access_token", token)])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let response = check_status(&self.settings_endpoint, response).await?;

        let settings: JsonValue = response.json().await.map_err(|e| SourceError::Malformed {
            endpoint: self.settings_endpoint.clone(),
            reason: e.to_string(),
        })?;

        heartbeat_from_settings(&settings).ok_or_else(|| SourceError::Malformed {
            endpoint: self.settings_endpoint.clone(),
            reason: "missing data.heartbeat_date".to_string(),
        })
    }
}

#[async_trait]
impl ObservationSource for ApiSource {
    async fn observe(&self) -> Result<String, SourceError> {
        let token = self.fetch_token().await?;
        self.fetch_heartbeat(&token).await
    }
}

async fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, SourceError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Status {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

/// `data.heartbeat_date`, strings verbatim and other scalars as JSON text
fn heartbeat_from_settings(settings: &JsonValue) -> Option<String> {
    match settings.get("data")?.get("heartbeat_date")? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> MonitorConfig {
        let mut config = MonitorConfig::new(server.uri());
        config.oauth_endpoint = "/oauth/token".to_string();
        config.settings_endpoint = "/api/settings".to_string();
        config.client_secret = "s3cret".to_string();
        config
    }

    #[test]
    fn test_heartbeat_from_settings() {
        let settings = json!({"data": {"heartbeat_date": "2024-01-01 00:00:00"}});
        assert_eq!(
            heartbeat_from_settings(&settings).as_deref(),
            Some("2024-01-01 00:00:00")
        );

        let settings = json!({"data": {"heartbeat_date": 1704067200}});
        assert_eq!(heartbeat_from_settings(&settings).as_deref(), Some("1704067200"));

        assert!(heartbeat_from_settings(&json!({"data": {"heartbeat_date": null}})).is_none());
        assert!(heartbeat_from_settings(&json!({"data": {}})).is_none());
        assert!(heartbeat_from_settings(&json!([])).is_none());
    }

    #[tokio::test]
    async fn test_observe_exchanges_token_then_reads_heartbeat() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_json(json!({
                "grant_type": "guest",
                "client_id": "store-front",
                "client_secret": "s3cret",
                "scope": "store-front-guest",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "guest-token",
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/settings"))
            .and(query_param("access_token", "guest-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"heartbeat_date": "2024-01-01 09:15:00"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = ApiSource::new(&config_for(&server)).unwrap();
        let heartbeat = source.observe().await.unwrap();
        assert_eq!(heartbeat, "2024-01-01 09:15:00");
    }

    #[tokio::test]
    async fn test_token_failure_stops_before_settings() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad client"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/settings"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let source = ApiSource::new(&config_for(&server)).unwrap();
        match source.observe().await {
            Err(SourceError::Status { status, body, .. }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad client");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_settings() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let source = ApiSource::new(&config_for(&server)).unwrap();
        assert!(matches!(
            source.observe().await,
            Err(SourceError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_api() {
        let config = MonitorConfig::new("http://127.0.0.1:1");
        let source = ApiSource::with_timeout(&config, Duration::from_secs(2)).unwrap();
        assert!(matches!(
            source.observe().await,
            Err(SourceError::Network(_))
        ));
    }
}
