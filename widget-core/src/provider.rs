use crate::{
    Conditions, Config,
    error::Result,
    provider::{mock::MockForecaster, worldweatheronline::WorldWeatherOnline},
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod mock;
pub mod worldweatheronline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WorldWeatherOnline,
    Mock,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WorldWeatherOnline => "worldweatheronline",
            ProviderId::Mock => "mock",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::WorldWeatherOnline, ProviderId::Mock]
    }

    /// Whether the provider refuses to start without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::WorldWeatherOnline)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the canonical id in any case, surrounding whitespace ignored, plus
/// the short form `wwo`.
impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "worldweatheronline" | "wwo" => Ok(ProviderId::WorldWeatherOnline),
            "mock" => Ok(ProviderId::Mock),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: {}.",
                ProviderId::all()
                    .iter()
                    .map(ProviderId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Looks up the current weather for a location.
///
/// Callers are expected to reject an empty location before calling.
/// Implementations make a single attempt and never retry.
#[async_trait]
pub trait Forecaster: Send + Sync + Debug {
    async fn forecast(&self, location: &str) -> Result<Conditions>;
}

/// Construct the configured forecaster.
pub fn forecaster_from_config(config: &Config) -> anyhow::Result<Box<dyn Forecaster>> {
    let id = config.provider_id()?;

    let api_key = match (id.requires_api_key(), config.api_key()) {
        (true, None) => anyhow::bail!(
            "No API key configured for provider '{id}'.\n\
             Hint: run `widget-server configure` or pass `--api-key`."
        ),
        (_, key) => key.unwrap_or_default(),
    };

    let boxed: Box<dyn Forecaster> = match id {
        ProviderId::WorldWeatherOnline => {
            let mut builder = reqwest::Client::builder();
            if let Some(secs) = config.timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            let http = builder.build().context("Failed to build HTTP client")?;

            Box::new(WorldWeatherOnline::with_client(
                api_key.to_owned(),
                config.base_url.clone(),
                http,
            ))
        }
        ProviderId::Mock => Box::new(MockForecaster::default()),
    };

    Ok(boxed)
}
