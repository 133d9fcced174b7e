//! Typed response schema for the zutool weather API.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Deserialize;

/// Leaf value that the API sends either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AspValue {
    Number(f64),
    Text(String),
}

impl AspValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Integral value, when the number (or numeric text) has no fraction.
    pub fn as_whole(&self) -> Option<i64> {
        match self {
            Self::Number(value) if value.fract() == 0.0 => Some(*value as i64),
            Self::Number(_) => None,
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl Display for AspValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) if value.fract() == 0.0 => write!(f, "{}", *value as i64),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherPoint {
    pub city_code: String,
    pub name: String,
    #[serde(default)]
    pub name_kata: Option<String>,
}

/// `result` arrives as a JSON-encoded string containing the point array,
/// and occasionally as the array itself.
#[derive(Debug, Deserialize)]
pub(crate) struct WeatherPointEnvelope {
    #[serde(default)]
    pub result: Option<WeatherPointResult>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WeatherPointResult {
    Points(Vec<WeatherPoint>),
    Encoded(String),
}

impl WeatherPointEnvelope {
    pub(crate) fn into_points(self) -> Result<Vec<WeatherPoint>, serde_json::Error> {
        match self.result {
            None => Ok(Vec::new()),
            Some(WeatherPointResult::Points(points)) => Ok(points),
            Some(WeatherPointResult::Encoded(encoded)) if encoded.trim().is_empty() => {
                Ok(Vec::new())
            }
            Some(WeatherPointResult::Encoded(encoded)) => serde_json::from_str(&encoded),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HourlyWeather {
    pub time: AspValue,
    pub weather: AspValue,
    #[serde(default)]
    pub temp: Option<AspValue>,
    pub pressure: AspValue,
    #[serde(default)]
    pub pressure_level: Option<AspValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherStatus {
    #[serde(default)]
    pub place_name: String,
    #[serde(default, rename = "dateTime")]
    pub date_time: Option<String>,
    #[serde(default)]
    pub today: Vec<HourlyWeather>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PainStatus {
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub time_start: String,
    #[serde(default)]
    pub time_end: String,
    #[serde(default, rename = "rate_0")]
    pub rate_normal: f64,
    #[serde(default, rename = "rate_1")]
    pub rate_little: f64,
    #[serde(default, rename = "rate_2")]
    pub rate_painful: f64,
    #[serde(default, rename = "rate_3")]
    pub rate_bad: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PainStatusEnvelope {
    pub painnoterate_status: PainStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OtenkiAsp {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub elements: Vec<AspElement>,
}

/// One forecast series. Keys of `records` are RFC 3339 timestamps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AspElement {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_id: String,
    #[serde(default)]
    pub records: BTreeMap<String, Option<AspValue>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_point_result_decodes_from_encoded_string() {
        let envelope: WeatherPointEnvelope = serde_json::from_str(
            r#"{"result":"[{\"city_code\":\"13101\",\"name\":\"Chiyoda\",\"name_kata\":\"チヨダ\"}]"}"#,
        )
        .expect("envelope should parse");

        let points = envelope.into_points().expect("points should decode");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].city_code, "13101");
        assert_eq!(points[0].name, "Chiyoda");
    }

    #[test]
    fn weather_point_result_accepts_inline_array_and_empty() {
        let inline: WeatherPointEnvelope =
            serde_json::from_str(r#"{"result":[{"city_code":"27100","name":"Osaka"}]}"#)
                .expect("inline should parse");
        assert_eq!(inline.into_points().expect("points")[0].name, "Osaka");

        let empty: WeatherPointEnvelope =
            serde_json::from_str(r#"{"result":""}"#).expect("empty should parse");
        assert!(empty.into_points().expect("points").is_empty());
    }

    #[test]
    fn asp_records_mix_numbers_text_and_null() {
        let asp: OtenkiAsp = serde_json::from_str(
            r#"{
                "date_time": "2025-04-01 09",
                "elements": [{
                    "title": "weather",
                    "content_id": "day_tenki",
                    "records": {
                        "2025-04-01T00:00:00+09:00": "101",
                        "2025-04-02T00:00:00+09:00": 200,
                        "2025-04-03T00:00:00+09:00": null
                    }
                }]
            }"#,
        )
        .expect("asp should parse");

        let records = &asp.elements[0].records;
        assert_eq!(
            records["2025-04-01T00:00:00+09:00"],
            Some(AspValue::Text("101".to_string()))
        );
        assert_eq!(
            records["2025-04-02T00:00:00+09:00"],
            Some(AspValue::Number(200.0))
        );
        assert_eq!(records["2025-04-03T00:00:00+09:00"], None);
    }

    #[test]
    fn asp_value_renders_whole_numbers_without_fraction() {
        assert_eq!(AspValue::Number(12.0).to_string(), "12");
        assert_eq!(AspValue::Number(12.5).to_string(), "12.5");
        assert_eq!(AspValue::Text("N".to_string()).to_string(), "N");
        assert_eq!(AspValue::Text("300".to_string()).as_whole(), Some(300));
    }
}
