//! The four weather tools advertised to the model.

use std::sync::Arc;

use kprovider::ToolDefinition;
use serde_json::{Map, Value};

use crate::{
    Tool, ToolError, ToolExecutionContext, ToolFuture, ToolResult, required_string,
    string_parameters,
};

use super::client::WeatherApi;
use super::format::{
    render_otenki_asp, render_pain_status, render_weather_points, render_weather_status,
};
use super::schema::WeatherPoint;

pub const GET_WEATHER: &str = "getWeather";
pub const GET_PAIN_STATUS: &str = "getPainStatus";
pub const SEARCH_WEATHER_POINT: &str = "searchWeatherPoint";
pub const GET_OTENKI_ASP_INFO: &str = "getOtenkiAspInfo";

/// Resolves a place name to its first matching point, or to the soft result
/// that should be returned instead.
async fn resolve_point(
    api: &dyn WeatherApi,
    location: &str,
    purpose: &str,
) -> Result<WeatherPoint, ToolResult> {
    let points = api.weather_points(location).await.map_err(|error| {
        ToolResult::soft_failure(
            format!("Sorry, I couldn't look up \"{location}\" to get the {purpose}."),
            error.to_string(),
        )
    })?;

    points.into_iter().next().ok_or_else(|| {
        ToolResult::soft_failure(
            format!("I couldn't find a place called \"{location}\", so there is no {purpose} for it."),
            format!("no weather point matched '{location}'"),
        )
    })
}

#[derive(Debug, Clone)]
pub struct GetWeatherTool {
    api: Arc<dyn WeatherApi>,
}

impl GetWeatherTool {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }
}

impl Tool for GetWeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            GET_WEATHER,
            "Get today's hourly weather for a place name.",
            string_parameters(&[("location", "Place to get the weather for")]),
        )
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Map<String, Value>,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let location = required_string(args, "location")?;
            let point = match resolve_point(self.api.as_ref(), &location, "weather").await {
                Ok(point) => point,
                Err(soft) => return Ok(soft),
            };

            match self.api.weather_status(&point.city_code).await {
                Ok(status) => Ok(ToolResult::ok(render_weather_status(
                    &location,
                    &point.name,
                    &status,
                ))),
                Err(error) => Ok(ToolResult::soft_failure(
                    format!(
                        "Sorry, fetching the weather for {} ({}) failed.",
                        point.name, point.city_code
                    ),
                    error.to_string(),
                )),
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct PainStatusTool {
    api: Arc<dyn WeatherApi>,
}

impl PainStatusTool {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }
}

impl Tool for PainStatusTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            GET_PAIN_STATUS,
            "Get the weather-related headache forecast for a place name.",
            string_parameters(&[("location", "Place to get the headache forecast for")]),
        )
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Map<String, Value>,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let location = required_string(args, "location")?;
            let point =
                match resolve_point(self.api.as_ref(), &location, "headache forecast").await {
                    Ok(point) => point,
                    Err(soft) => return Ok(soft),
                };

            // The area code is the prefecture prefix of the city code.
            let Some(area_code) = point.city_code.get(..2) else {
                return Ok(ToolResult::soft_failure(
                    format!(
                        "I couldn't work out the area for {} ({location}).",
                        point.name
                    ),
                    format!("city code '{}' is too short for an area code", point.city_code),
                ));
            };

            match self.api.pain_status(area_code, &point.city_code).await {
                Ok(status) => Ok(ToolResult::ok(render_pain_status(
                    &location,
                    &point.name,
                    &status,
                ))),
                Err(error) => Ok(ToolResult::soft_failure(
                    format!(
                        "Sorry, fetching the headache forecast for {} ({}) failed.",
                        point.name, point.city_code
                    ),
                    error.to_string(),
                )),
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct SearchWeatherPointTool {
    api: Arc<dyn WeatherApi>,
}

impl SearchWeatherPointTool {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }
}

impl Tool for SearchWeatherPointTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SEARCH_WEATHER_POINT,
            "Search weather points by keyword and list their point codes.",
            string_parameters(&[("keyword", "Place name or keyword to search for")]),
        )
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Map<String, Value>,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let keyword = required_string(args, "keyword")?;
            match self.api.weather_points(&keyword).await {
                Ok(points) => Ok(ToolResult::ok(render_weather_points(&keyword, &points))),
                Err(error) => Ok(ToolResult::soft_failure(
                    format!("Sorry, searching weather points for \"{keyword}\" failed."),
                    error.to_string(),
                )),
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct OtenkiAspTool {
    api: Arc<dyn WeatherApi>,
}

impl OtenkiAspTool {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }
}

impl Tool for OtenkiAspTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            GET_OTENKI_ASP_INFO,
            "Get the multi-day forecast table for a weather point code.",
            string_parameters(&[("cityCode", "Weather point code, e.g. from searchWeatherPoint")]),
        )
    }

    fn invoke<'a>(
        &'a self,
        args: &'a Map<String, Value>,
        _context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolResult, ToolError>> {
        Box::pin(async move {
            let city_code = required_string(args, "cityCode")?;
            match self.api.otenki_asp(&city_code).await {
                Ok(asp) => Ok(ToolResult::ok(render_otenki_asp(&city_code, &asp))),
                Err(error) => Ok(ToolResult::soft_failure(
                    format!("Sorry, fetching the forecast for point {city_code} failed."),
                    error.to_string(),
                )),
            }
        })
    }
}
