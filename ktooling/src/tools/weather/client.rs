//! Weather data source trait and the zutool reqwest client.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::{ToolError, ToolFuture};

use super::schema::{
    OtenkiAsp, PainStatus, PainStatusEnvelope, WeatherPoint, WeatherPointEnvelope, WeatherStatus,
};

pub const ZUTOOL_BASE_URL: &str = "https://zutool.jp/api";
pub const ZUTOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// External weather lookups consumed by the weather tools. Errors describe a
/// downstream failure; the tools turn them into soft results.
pub trait WeatherApi: Send + Sync + std::fmt::Debug {
    fn weather_points<'a>(
        &'a self,
        keyword: &'a str,
    ) -> ToolFuture<'a, Result<Vec<WeatherPoint>, ToolError>>;

    fn weather_status<'a>(
        &'a self,
        city_code: &'a str,
    ) -> ToolFuture<'a, Result<WeatherStatus, ToolError>>;

    fn pain_status<'a>(
        &'a self,
        area_code: &'a str,
        set_point: &'a str,
    ) -> ToolFuture<'a, Result<PainStatus, ToolError>>;

    fn otenki_asp<'a>(&'a self, city_code: &'a str)
    -> ToolFuture<'a, Result<OtenkiAsp, ToolError>>;
}

#[derive(Debug, Clone)]
pub struct ZutoolClient {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl ZutoolClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: ZUTOOL_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Builds its own HTTP client bounded by [`ZUTOOL_TIMEOUT`].
    pub fn with_default_timeout() -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(ZUTOOL_TIMEOUT)
            .build()
            .map_err(|err| ToolError::execution(format!("failed to build zutool client: {err}")))?;
        let mut zutool = Self::new(client);
        zutool.timeout = Some(ZUTOOL_TIMEOUT);
        Ok(zutool)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request timeout of the owned client; `None` when the caller supplied it.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn url(&self, path: &str, argument: &str) -> Result<Url, ToolError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            ToolError::execution(format!("invalid zutool base url {}: {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ToolError::execution(format!(
                    "zutool base url {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(path)
            .push(argument);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, ToolError> {
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|err| ToolError::execution(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::execution(format!(
                "zutool returned http {status} for {url}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ToolError::execution(format!("failed to decode zutool response: {err}")))
    }
}

impl WeatherApi for ZutoolClient {
    fn weather_points<'a>(
        &'a self,
        keyword: &'a str,
    ) -> ToolFuture<'a, Result<Vec<WeatherPoint>, ToolError>> {
        Box::pin(async move {
            let envelope: WeatherPointEnvelope = self
                .get_json(self.url("getweatherpoint", keyword)?, &[])
                .await?;
            envelope.into_points().map_err(|err| {
                ToolError::execution(format!("failed to decode weather point list: {err}"))
            })
        })
    }

    fn weather_status<'a>(
        &'a self,
        city_code: &'a str,
    ) -> ToolFuture<'a, Result<WeatherStatus, ToolError>> {
        Box::pin(async move {
            self.get_json(self.url("getweatherstatus", city_code)?, &[])
                .await
        })
    }

    fn pain_status<'a>(
        &'a self,
        area_code: &'a str,
        set_point: &'a str,
    ) -> ToolFuture<'a, Result<PainStatus, ToolError>> {
        Box::pin(async move {
            let envelope: PainStatusEnvelope = self
                .get_json(
                    self.url("getpainstatus", area_code)?,
                    &[("set_point", set_point)],
                )
                .await?;
            Ok(envelope.painnoterate_status)
        })
    }

    fn otenki_asp<'a>(
        &'a self,
        city_code: &'a str,
    ) -> ToolFuture<'a, Result<OtenkiAsp, ToolError>> {
        Box::pin(async move { self.get_json(self.url("getotenkiasp", city_code)?, &[]).await })
    }
}
