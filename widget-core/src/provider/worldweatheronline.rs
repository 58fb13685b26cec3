use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    Conditions,
    error::{ProviderError, Result},
};

use super::Forecaster;

pub const DEFAULT_BASE_URL: &str = "https://api.worldweatheronline.com";
const WEATHER_ENDPOINT: &str = "premium/v1/weather.ashx";

/// Forecaster backed by the World Weather Online premium API.
#[derive(Debug, Clone)]
pub struct WorldWeatherOnline {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WorldWeatherOnline {
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self::with_client(api_key, base_url, Client::new())
    }

    pub fn with_client(api_key: String, base_url: impl Into<String>, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), WEATHER_ENDPOINT)
    }

    async fn fetch(&self, location: &str) -> Result<Conditions, ProviderError> {
        tracing::debug!(location, "requesting forecast from World Weather Online");

        let res = self
            .http
            .get(self.endpoint())
            .query(&[
                ("format", "json"),
                ("num_days", "1"),
                ("key", self.api_key.as_str()),
                ("q", location),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if status != StatusCode::OK {
            return Err(ProviderError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        parse_conditions(&body)
    }
}

#[async_trait]
impl Forecaster for WorldWeatherOnline {
    async fn forecast(&self, location: &str) -> Result<Conditions> {
        Ok(self.fetch(location).await?)
    }
}

#[derive(Debug, Deserialize)]
struct WwoResponse {
    data: WwoData,
}

#[derive(Debug, Deserialize)]
struct WwoData {
    #[serde(default)]
    error: Option<Vec<WwoError>>,
    #[serde(default)]
    request: Vec<WwoRequest>,
    #[serde(default)]
    current_condition: Vec<WwoCondition>,
}

#[derive(Debug, Deserialize)]
struct WwoError {
    msg: String,
}

#[derive(Debug, Deserialize)]
struct WwoRequest {
    #[serde(rename = "type")]
    kind: String,
    query: String,
}

#[derive(Debug, Deserialize)]
struct WwoCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<WwoValue>,
}

#[derive(Debug, Deserialize)]
struct WwoValue {
    value: String,
}

/// Turns a response body into conditions.
///
/// Errors the provider embeds in the body win over everything else; after
/// that every array the conditions are read from must have an entry.
fn parse_conditions(body: &str) -> Result<Conditions, ProviderError> {
    let parsed: WwoResponse = serde_json::from_str(body)?;
    let data = parsed.data;

    if let Some(errors) = data.error.filter(|errors| !errors.is_empty()) {
        let messages: Vec<_> = errors.into_iter().map(|e| e.msg).collect();
        return Err(ProviderError::Api(messages.join(",")));
    }

    let request = data
        .request
        .first()
        .ok_or_else(|| ProviderError::Parse("response contained no request data".into()))?;

    let current = data
        .current_condition
        .first()
        .ok_or_else(|| ProviderError::Parse("response contained no current conditions".into()))?;

    let description = current
        .weather_desc
        .first()
        .ok_or_else(|| ProviderError::Parse("response contained no weather description".into()))?;

    let celsius = current.temp_c.trim().parse::<i32>().map_err(|e| {
        ProviderError::Parse(format!("temp_C '{}' is not an integer: {e}", current.temp_c))
    })?;

    Ok(Conditions::new(
        format!("{} {}", request.kind, request.query),
        celsius,
        description.value.clone(),
    ))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
