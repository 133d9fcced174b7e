//! Text rendering for weather tool results.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::schema::{AspValue, OtenkiAsp, PainStatus, WeatherPoint, WeatherStatus};

const ASP_COLUMNS: usize = 8;

/// Maps a weather code to a glyph by its hundreds digit. Codes without a
/// glyph, and values that are not whole numbers, render verbatim.
pub fn weather_glyph(code: &AspValue) -> String {
    let Some(value) = code.as_whole() else {
        return code.to_string();
    };

    match (value / 100) * 100 {
        100 => "☀️".to_string(),
        200 => "☁️".to_string(),
        300 => "🌧️".to_string(),
        400 => "🌨️".to_string(),
        _ => code.to_string(),
    }
}

pub fn render_weather_status(location: &str, fallback_name: &str, status: &WeatherStatus) -> String {
    let place = if status.place_name.is_empty() {
        fallback_name
    } else {
        status.place_name.as_str()
    };

    let mut output = format!("[{place} ({location}) weather]\n");
    if status.today.is_empty() {
        output.push_str("  No detailed forecast is available for today.\n");
        return output;
    }

    output.push_str("Today:\n");
    for hour in &status.today {
        let temp = hour
            .temp
            .as_ref()
            .map(|temp| format!("{temp}℃"))
            .unwrap_or_else(|| "---".to_string());
        let _ = writeln!(
            output,
            "  {}: {}, {}hPa, {}",
            hour.time,
            temp,
            hour.pressure,
            weather_glyph(&hour.weather)
        );
    }

    output
}

pub fn render_pain_status(location: &str, fallback_name: &str, status: &PainStatus) -> String {
    let area = if status.area_name.is_empty() {
        fallback_name
    } else {
        status.area_name.as_str()
    };

    let mut output = format!("[{area} ({location}) headache forecast]\n");
    let _ = writeln!(output, "Period: {} - {}", status.time_start, status.time_end);
    output.push_str("Share of forecast levels:\n");
    let _ = writeln!(output, "  normal: {:.1}%", status.rate_normal);
    let _ = writeln!(output, "  slight: {:.1}%", status.rate_little);
    let _ = writeln!(output, "  painful: {:.1}%", status.rate_painful);
    let _ = writeln!(output, "  severe: {:.1}%", status.rate_bad);
    output
}

pub fn render_weather_points(keyword: &str, points: &[WeatherPoint]) -> String {
    let mut output = format!("[Weather points matching \"{keyword}\"]\n");
    if points.is_empty() {
        let _ = writeln!(output, "  No point matched \"{keyword}\".");
        return output;
    }

    for point in points {
        let _ = writeln!(output, "  - {}: {}", point.city_code, point.name);
    }
    output
}

/// `YYYY-MM-DD HH` or RFC 3339, rendered as `YYYY-MM-DD HH:MM`.
pub fn format_report_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim) else {
        return "unknown".to_string();
    };

    if let Ok(parsed) = NaiveDateTime::parse_from_str(&format!("{raw}:00"), "%Y-%m-%d %H:%M") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }

    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => "unknown".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AspColumn {
    Weather,
    Whole,
    Decimal,
}

impl AspColumn {
    fn for_index(index: usize) -> Self {
        match index {
            0 => Self::Weather,
            2 | 3 | 4 => Self::Decimal,
            _ => Self::Whole,
        }
    }

    fn render(self, value: Option<&AspValue>) -> String {
        let Some(value) = value else {
            return "-".to_string();
        };

        match (self, value) {
            (Self::Weather, _) => weather_glyph(value),
            (_, AspValue::Text(text)) => text.clone(),
            (Self::Whole, AspValue::Number(number)) if number.fract() == 0.0 => {
                format!("{}", *number as i64)
            }
            (_, AspValue::Number(number)) => format!("{number:.1}"),
        }
    }
}

/// Multi-day forecast as a Markdown table. Element order fixes the columns:
/// weather, precipitation, max, min, wind speed, wind direction, pressure
/// level, humidity.
pub fn render_otenki_asp(city_code: &str, asp: &OtenkiAsp) -> String {
    let mut output = format!(
        "[{city_code} forecast ({})]\n",
        format_report_time(asp.date_time.as_deref())
    );

    if asp.elements.is_empty() {
        output.push_str("  No forecast elements were returned.\n");
        return output;
    }

    let mut days: BTreeMap<NaiveDate, [Option<AspValue>; ASP_COLUMNS]> = BTreeMap::new();
    for (index, element) in asp.elements.iter().take(ASP_COLUMNS).enumerate() {
        for (timestamp, value) in &element.records {
            let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
                continue;
            };

            let row = days.entry(parsed.date_naive()).or_default();
            row[index] = value.clone();
        }
    }

    output.push_str(
        "| Date | Weather | Precip% | Max℃ | Min℃ | Wind m/s | Wind dir | Pressure Lv | Humidity% |\n",
    );
    output.push_str("|:---|:---|:----:|:-----:|:-----:|:------:|:--:|:------:|:----:|\n");

    for (date, row) in &days {
        let mut cells = vec![date.format("%m/%d").to_string()];
        cells.extend(
            row.iter()
                .enumerate()
                .map(|(index, value)| AspColumn::for_index(index).render(value.as_ref())),
        );
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }

    output
}
