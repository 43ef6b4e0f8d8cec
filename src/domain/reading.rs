// Glucose reading domain models
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Readings above this value (mg/dL) are high
pub const HIGH_THRESHOLD_MG_DL: f64 = 140.0;
/// Readings below this value (mg/dL) are low
pub const LOW_THRESHOLD_MG_DL: f64 = 70.0;

/// Current reading as the vendor sends it (`data.connection.glucoseItem`).
///
/// The object is kept exactly as received; only the fields the dashboard
/// needs are read, and a field of an unexpected type reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawReading(pub Map<String, Value>);

/// One historical sample from `data.graphData`, kept exactly as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSeriesPoint(pub Map<String, Value>);

fn number_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Number> {
    match fields.get(key) {
        Some(Value::Number(n)) => Some(n),
        _ => None,
    }
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a str {
    fields.get(key).and_then(Value::as_str).unwrap_or_default()
}

impl RawReading {
    /// `Value` in mg/dL, as the vendor encoded it
    pub fn value(&self) -> Option<&Number> {
        number_field(&self.0, "Value")
    }

    /// `TrendArrow` code; missing or malformed codes read as 0
    pub fn trend_arrow(&self) -> i64 {
        self.0.get("TrendArrow").and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn timestamp(&self) -> &str {
        str_field(&self.0, "Timestamp")
    }

    pub fn is_high(&self) -> bool {
        self.0.get("isHigh").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn is_low(&self) -> bool {
        self.0.get("isLow").and_then(Value::as_bool).unwrap_or(false)
    }

    fn passthrough(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }
}

impl RawSeriesPoint {
    pub fn value(&self) -> Option<&Number> {
        number_field(&self.0, "Value")
    }

    pub fn timestamp(&self) -> &str {
        str_field(&self.0, "Timestamp")
    }
}

/// Result of one vendor fetch: the current reading and the trailing series
#[derive(Debug, Clone, PartialEq)]
pub struct GlucoseFetch {
    pub reading: RawReading,
    pub series: Vec<RawSeriesPoint>,
}

/// Reduced reading served by the local API route.
///
/// Values are copied from the vendor object untouched; a field the vendor
/// left out is left out here too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedGlucose {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_high: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_low: Option<Value>,
}

impl From<&RawReading> for SimplifiedGlucose {
    fn from(raw: &RawReading) -> Self {
        Self {
            value: raw.passthrough("Value"),
            trend: raw.passthrough("TrendArrow"),
            timestamp: raw.passthrough("Timestamp"),
            measurement_color: raw.passthrough("MeasurementColor"),
            is_high: raw.passthrough("isHigh"),
            is_low: raw.passthrough("isLow"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GlucoseLevel {
    Normal,
    High,
    Low,
}

impl GlucoseLevel {
    /// Bounds are exclusive: 70 and 140 are both normal.
    pub fn classify(value: f64) -> Self {
        if value > HIGH_THRESHOLD_MG_DL {
            GlucoseLevel::High
        } else if value < LOW_THRESHOLD_MG_DL {
            GlucoseLevel::Low
        } else {
            GlucoseLevel::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GlucoseLevel::Normal => "Normal",
            GlucoseLevel::High => "High",
            GlucoseLevel::Low => "Low",
        }
    }

    /// CSS colour used for the value and status text
    pub fn color(self) -> &'static str {
        match self {
            GlucoseLevel::Normal => "#4ade80",
            GlucoseLevel::High => "#f87171",
            GlucoseLevel::Low => "#60a5fa",
        }
    }
}

/// Reading as the dashboard consumes it.
///
/// `level` is derived from `value` here while `is_high`/`is_low` are the
/// vendor's own flags. They can disagree and both are kept as they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReading {
    pub value: Number,
    pub trend: i64,
    pub timestamp: String,
    pub level: GlucoseLevel,
    pub is_high: bool,
    pub is_low: bool,
}

impl NormalizedReading {
    /// `None` when the reading carries no numeric `Value`
    pub fn from_raw(raw: &RawReading) -> Option<Self> {
        let value = raw.value()?.clone();
        let level = GlucoseLevel::classify(value.as_f64()?);
        Some(Self {
            value,
            trend: raw.trend_arrow(),
            timestamp: raw.timestamp().to_string(),
            level,
            is_high: raw.is_high(),
            is_low: raw.is_low(),
        })
    }

    pub fn mg_dl(&self) -> f64 {
        self.value.as_f64().unwrap_or_default()
    }
}

/// Parse a vendor timestamp such as `1/15/2024 10:23:45 AM`.
/// RFC 3339 strings are accepted as well.
pub fn parse_vendor_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp.trim(), "%m/%d/%Y %I:%M:%S %p")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(timestamp.trim())
                .ok()
                .map(|t| t.naive_local())
        })
}

/// Hours and minutes of a vendor timestamp, or the raw text if it can't be parsed
pub fn format_clock(timestamp: &str) -> String {
    match parse_vendor_timestamp(timestamp) {
        Some(time) => time.format("%H:%M").to_string(),
        None => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawReading {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(GlucoseLevel::classify(69.0), GlucoseLevel::Low);
        assert_eq!(GlucoseLevel::classify(70.0), GlucoseLevel::Normal);
        assert_eq!(GlucoseLevel::classify(105.0), GlucoseLevel::Normal);
        assert_eq!(GlucoseLevel::classify(140.0), GlucoseLevel::Normal);
        assert_eq!(GlucoseLevel::classify(141.0), GlucoseLevel::High);
        assert_eq!(GlucoseLevel::classify(69.9), GlucoseLevel::Low);
        assert_eq!(GlucoseLevel::classify(140.1), GlucoseLevel::High);
    }

    #[test]
    fn test_normalize_keeps_vendor_flags_independent() {
        // Vendor thresholds differ from ours: 150 is not high for the vendor
        let reading = NormalizedReading::from_raw(&raw(
            json!({"Value": 150, "TrendArrow": 5, "isHigh": false, "isLow": false}),
        ))
        .unwrap();
        assert_eq!(reading.level, GlucoseLevel::High);
        assert!(!reading.is_high);
        assert!(!reading.is_low);

        let reading =
            NormalizedReading::from_raw(&raw(json!({"Value": 100, "isHigh": true}))).unwrap();
        assert_eq!(reading.level, GlucoseLevel::Normal);
        assert!(reading.is_high);
    }

    #[test]
    fn test_normalize_copies_fields() {
        let reading = NormalizedReading::from_raw(&raw(json!({
            "Timestamp": "1/15/2024 10:23:45 AM",
            "Value": 64,
            "TrendArrow": 1,
            "isLow": true
        })))
        .unwrap();
        assert_eq!(reading.value, Number::from(64));
        assert_eq!(reading.mg_dl(), 64.0);
        assert_eq!(reading.trend, 1);
        assert_eq!(reading.timestamp, "1/15/2024 10:23:45 AM");
        assert_eq!(reading.level, GlucoseLevel::Low);
    }

    #[test]
    fn test_normalize_tolerates_odd_fields() {
        let reading = NormalizedReading::from_raw(&raw(json!({
            "Value": 150,
            "TrendArrow": null,
            "MeasurementColor": null,
            "isHigh": "yes"
        })))
        .unwrap();
        assert_eq!(reading.trend, 0);
        assert!(!reading.is_high);
        assert_eq!(reading.timestamp, "");
    }

    #[test]
    fn test_normalize_requires_numeric_value() {
        assert!(NormalizedReading::from_raw(&raw(json!({"TrendArrow": 3}))).is_none());
        assert!(NormalizedReading::from_raw(&raw(json!({"Value": null}))).is_none());
    }

    #[test]
    fn test_series_point_round_trips_unchanged() {
        let input = json!({
            "FactoryTimestamp": "1/15/2024 3:08:45 PM",
            "Timestamp": "1/15/2024 10:08:45 AM",
            "Value": 132,
            "isHigh": false,
            "extraField": "kept"
        });
        let point: RawSeriesPoint = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(point.value(), Some(&Number::from(132)));
        assert_eq!(point.timestamp(), "1/15/2024 10:08:45 AM");

        let out = serde_json::to_value(&point).unwrap();
        assert_eq!(out, input);
        assert_eq!(serde_json::to_string(&point.value()).unwrap(), "132");
    }

    #[test]
    fn test_simplified_glucose_copies_vendor_values() {
        let simplified = SimplifiedGlucose::from(&raw(json!({
            "Timestamp": "1/15/2024 10:23:45 AM",
            "Value": 150,
            "TrendArrow": 5,
            "MeasurementColor": null,
            "isHigh": false
        })));
        let json = serde_json::to_string(&simplified).unwrap();
        assert_eq!(
            json,
            r#"{"value":150,"trend":5,"timestamp":"1/15/2024 10:23:45 AM","measurementColor":null,"isHigh":false}"#
        );
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock("1/15/2024 10:23:45 AM"), "10:23");
        assert_eq!(format_clock("1/15/2024 3:05:00 PM"), "15:05");
        assert_eq!(format_clock("2024-01-15T10:23:45Z"), "10:23");
        assert_eq!(format_clock("not a time"), "not a time");
    }
}
