//! `!weather <city>` via wttr.in.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::common::error::{ScriptError, ScriptResult};

const WTTR_BASE_URL: &str = "https://wttr.in/";

pub const WEATHER_USAGE: &str = "Usage: !weather cityname";

#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Short weather report for a city. May be blank.
    async fn report(&self, city: &str) -> ScriptResult<String>;
}

/// wttr.in plain-text reports.
pub struct WttrWeather {
    client: Client,
    format: String,
}

impl WttrWeather {
    pub fn new(client: Client, format: impl Into<String>) -> Self {
        Self {
            client,
            format: format.into(),
        }
    }

    fn url_for(&self, city: &str) -> ScriptResult<Url> {
        let mut url = Url::parse(WTTR_BASE_URL).map_err(|e| ScriptError::Parse {
            message: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ScriptError::Parse {
                message: "base URL cannot have a path".to_string(),
            })?
            .clear()
            .push(city);
        url.query_pairs_mut().append_pair("format", &self.format);
        Ok(url)
    }
}

#[async_trait]
impl WeatherService for WttrWeather {
    async fn report(&self, city: &str) -> ScriptResult<String> {
        let url = self.url_for(city)?;
        let response = self
            .client
            .get(url)
            .header("User-Agent", concat!("minibot/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Command handler; always produces a chat line.
pub struct WeatherScript {
    service: Arc<dyn WeatherService>,
}

impl WeatherScript {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }

    pub async fn handle(&self, city: &str) -> String {
        let city = city.trim();
        if city.is_empty() {
            return WEATHER_USAGE.to_string();
        }

        debug!("Weather: requesting report for {}", city);
        match self.service.report(city).await {
            Ok(report) if !report.trim().is_empty() => {
                format!("Weather for {}: {}", city, report.trim())
            }
            Ok(_) => format!("Could not retrieve weather for {}.", city),
            Err(e) => {
                warn!("Weather: request for {} failed: {}", city, e);
                format!("Error getting weather: {}", e)
            }
        }
    }
}
