//! Profiler record model and numeric coercion.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One profiler measurement for a named section.
///
/// Summary metrics are kept as the raw JSON values they arrived as (numbers or
/// numeric strings) and are coerced on use through [`to_number`]. Nothing here
/// checks that `min <= avg <= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(
        rename = "Section Name",
        default,
        deserialize_with = "lenient_name"
    )]
    pub section_name: String,
    #[serde(rename = "Avg Time", default)]
    pub avg_time: Value,
    #[serde(rename = "Max Time", default)]
    pub max_time: Value,
    #[serde(rename = "Min Time", default)]
    pub min_time: Value,
    #[serde(rename = "Total Time", default)]
    pub total_time: Value,
    #[serde(rename = "Timeline", default, deserialize_with = "lenient_timeline")]
    pub timeline: Vec<Value>,
}

/// Coerce a raw field into a number.
///
/// Numbers pass through unchanged. Strings are trimmed and must be a numeric
/// literal: decimal with optional exponent, `Infinity` with an optional sign,
/// or an unsigned `0x`/`0o`/`0b` integer. Anything else is NaN, including the
/// empty string, `inf`, `nan`, null, bools, arrays and objects.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_numeric_text(s.trim()),
        _ => f64::NAN,
    }
}

fn parse_numeric_text(text: &str) -> f64 {
    let (sign, body) = match text.as_bytes().first() {
        Some(b'+') => (1.0, &text[1..]),
        Some(b'-') => (-1.0, &text[1..]),
        _ => (1.0, text),
    };
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    if is_decimal_literal(body) {
        return text.parse::<f64>().unwrap_or(f64::NAN);
    }
    if body.len() == text.len() {
        if let Some(value) = parse_radix_literal(body) {
            return value;
        }
    }
    f64::NAN
}

/// `digits [. digits] [e [sign] digits]`, with at least one mantissa digit.
fn is_decimal_literal(text: &str) -> bool {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(idx) => (&text[..idx], Some(&text[idx + 1..])),
        None => (text, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int) || !all_digits(frac) || int.len() + frac.len() == 0 {
        return false;
    }
    match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && all_digits(digits)
        }
    }
}

fn parse_radix_literal(text: &str) -> Option<f64> {
    let radix = match text.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix)
            .map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

impl Record {
    pub fn new(section_name: impl Into<String>) -> Self {
        Self {
            section_name: section_name.into(),
            avg_time: Value::Null,
            max_time: Value::Null,
            min_time: Value::Null,
            total_time: Value::Null,
            timeline: Vec::new(),
        }
    }

    pub fn raw(&self, metric: Metric) -> &Value {
        match metric {
            Metric::Avg => &self.avg_time,
            Metric::Max => &self.max_time,
            Metric::Min => &self.min_time,
            Metric::Total => &self.total_time,
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        to_number(self.raw(metric))
    }

    /// Timeline as `(call, duration)` pairs, with 1-based call indices.
    /// Entries that do not coerce to a number are skipped but keep their
    /// position in the call numbering.
    pub fn timeline_points(&self) -> Vec<(usize, f64)> {
        self.timeline
            .iter()
            .enumerate()
            .map(|(idx, raw)| (idx + 1, to_number(raw)))
            .filter(|(_, time)| !time.is_nan())
            .collect()
    }
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_timeline<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

/// One of the four summary metrics of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Avg,
    Max,
    Min,
    Total,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Avg, Metric::Max, Metric::Min, Metric::Total];

    /// JSON field name in the profiler file.
    pub fn field(self) -> &'static str {
        match self {
            Self::Avg => "Avg Time",
            Self::Max => "Max Time",
            Self::Min => "Min Time",
            Self::Total => "Total Time",
        }
    }

    /// Human-readable axis label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Avg => "Average Time",
            Self::Max => "Max Time",
            Self::Min => "Min Time",
            Self::Total => "Total Time",
        }
    }
}

impl clap::ValueEnum for Metric {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Avg => clap::builder::PossibleValue::new("avg"),
            Self::Max => clap::builder::PossibleValue::new("max"),
            Self::Min => clap::builder::PossibleValue::new("min"),
            Self::Total => clap::builder::PossibleValue::new("total"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn label(self) -> &'static str {
        match self {
            Self::Asc => "ascending",
            Self::Desc => "descending",
        }
    }
}

impl clap::ValueEnum for SortOrder {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Asc, Self::Desc]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Asc => clap::builder::PossibleValue::new("asc"),
            Self::Desc => clap::builder::PossibleValue::new("desc"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(to_number(&serde_json::json!(1.5)), 1.5);
        assert_eq!(to_number(&serde_json::json!(3)), 3.0);
        assert_eq!(to_number(&serde_json::json!(" 2.25 ")), 2.25);
        assert_eq!(to_number(&serde_json::json!("1e-3")), 0.001);
    }

    #[test]
    fn to_number_accepts_every_numeric_literal_form() {
        assert_eq!(to_number(&serde_json::json!("Infinity")), f64::INFINITY);
        assert_eq!(to_number(&serde_json::json!("+Infinity")), f64::INFINITY);
        assert_eq!(to_number(&serde_json::json!(" -Infinity ")), f64::NEG_INFINITY);
        assert_eq!(to_number(&serde_json::json!(".5")), 0.5);
        assert_eq!(to_number(&serde_json::json!("5.")), 5.0);
        assert_eq!(to_number(&serde_json::json!("-2E+2")), -200.0);
        assert_eq!(to_number(&serde_json::json!("0x1F")), 31.0);
        assert_eq!(to_number(&serde_json::json!("0o17")), 15.0);
        assert_eq!(to_number(&serde_json::json!("0b101")), 5.0);
    }

    #[test]
    fn to_number_is_nan_for_everything_else() {
        for raw in [
            serde_json::json!(null),
            serde_json::json!(""),
            serde_json::json!("   "),
            serde_json::json!("fast"),
            serde_json::json!("inf"),
            serde_json::json!("-inf"),
            serde_json::json!("infinity"),
            serde_json::json!("INFINITY"),
            serde_json::json!("nan"),
            serde_json::json!("NaN"),
            serde_json::json!("1.2.3"),
            serde_json::json!("1e"),
            serde_json::json!("."),
            serde_json::json!("-0x10"),
            serde_json::json!("0x"),
            serde_json::json!("12ms"),
            serde_json::json!(true),
            serde_json::json!([1]),
            serde_json::json!({"v": 1}),
        ] {
            assert!(to_number(&raw).is_nan(), "expected NaN for {raw}");
        }
    }

    #[test]
    fn sort_order_labels_read_as_words() {
        assert_eq!(SortOrder::Asc.label(), "ascending");
        assert_eq!(SortOrder::Desc.label(), "descending");
    }

    #[test]
    fn record_reads_profiler_field_names() {
        let rec: Record = serde_json::from_value(serde_json::json!({
            "Section Name": "Trig Speed Test",
            "Avg Time": "0.5",
            "Max Time": 0.9,
            "Min Time": 0.1,
            "Total Time": 1.5,
            "Timeline": [0.1, 0.5, 0.9]
        }))
        .expect("record");
        assert_eq!(rec.section_name, "Trig Speed Test");
        assert_eq!(rec.value(Metric::Avg), 0.5);
        assert_eq!(rec.value(Metric::Total), 1.5);
        assert_eq!(rec.timeline_points(), vec![(1, 0.1), (2, 0.5), (3, 0.9)]);

        let back = serde_json::to_value(&rec).expect("json");
        assert_eq!(back["Avg Time"], serde_json::json!("0.5"));
        assert!(back.get("Timeline").is_some());
    }

    #[test]
    fn missing_fields_become_nan_or_empty() {
        let rec: Record =
            serde_json::from_value(serde_json::json!({"Section Name": 42, "Timeline": "n/a"}))
                .expect("record");
        assert_eq!(rec.section_name, "42");
        assert!(rec.value(Metric::Max).is_nan());
        assert!(rec.timeline.is_empty());
    }

    #[test]
    fn timeline_points_skip_non_numeric_but_keep_call_index() {
        let mut rec = Record::new("a");
        rec.timeline = vec![
            serde_json::json!(1.0),
            serde_json::json!("bad"),
            serde_json::json!(3.0),
        ];
        assert_eq!(rec.timeline_points(), vec![(1, 1.0), (3, 3.0)]);
    }
}
