//! Weather lookups backed by the zutool API.

mod client;
mod format;
mod schema;
mod tools;

use std::sync::Arc;

use crate::ToolRegistry;

pub use client::{WeatherApi, ZUTOOL_BASE_URL, ZUTOOL_TIMEOUT, ZutoolClient};
pub use format::{format_report_time, weather_glyph};
pub use schema::{
    AspElement, AspValue, HourlyWeather, OtenkiAsp, PainStatus, WeatherPoint, WeatherStatus,
};
pub use tools::{
    GET_OTENKI_ASP_INFO, GET_PAIN_STATUS, GET_WEATHER, GetWeatherTool, OtenkiAspTool,
    PainStatusTool, SEARCH_WEATHER_POINT, SearchWeatherPointTool,
};

/// Registers every weather tool against one data source.
pub fn register_weather_tools(registry: &mut ToolRegistry, api: Arc<dyn WeatherApi>) {
    registry.register(GetWeatherTool::new(Arc::clone(&api)));
    registry.register(PainStatusTool::new(Arc::clone(&api)));
    registry.register(SearchWeatherPointTool::new(Arc::clone(&api)));
    registry.register(OtenkiAspTool::new(api));
}
