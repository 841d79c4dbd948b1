//! Strategy-driven field value formatting (encode side).
//!
//! The mirror image of [`crate::parse`]: typed values become field
//! strings under the same strategy set. Formatting is total except for
//! non-finite floats, which are rejected rather than emitted.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::TypeError;
use crate::strategy::{BoolStrategy, DateStrategy, LocaleStyle, NumberStrategy};
use crate::value::CsvValue;

/// Field-string formatter configured with the encode strategies.
#[derive(Debug, Clone, Default)]
pub struct ValueFormatter {
    /// Boolean spelling strategy (custom sets emit their first token).
    pub bools: BoolStrategy,
    /// Numeric strategy (locale-aware strategies emit that locale's
    /// decimal separator).
    pub numbers: NumberStrategy,
    /// Date rendering strategy.
    pub dates: DateStrategy,
}

impl ValueFormatter {
    /// Format a typed value as a field string.
    ///
    /// `Null` formats as the empty string; the encoder substitutes its
    /// configured nil representation upstream of this call.
    pub fn format(&self, value: &CsvValue) -> Result<String, TypeError> {
        match value {
            CsvValue::Null => Ok(String::new()),
            CsvValue::Bool(v) => Ok(self.format_bool(*v)),
            CsvValue::Int(v) => Ok(v.to_string()),
            CsvValue::Float(v) => self.format_float(*v),
            CsvValue::Decimal(v) => Ok(v.normalize().to_string()),
            CsvValue::String(v) => Ok(v.clone()),
            CsvValue::Date(v) => Ok(self.format_date(*v)),
            CsvValue::DateTime(v) => Ok(self.format_datetime(*v)),
            CsvValue::Json(v) => serde_json::to_string(v)
                .map_err(|e| TypeError::Unrepresentable(format!("JSON serialization: {e}"))),
            CsvValue::Record(_) => Err(TypeError::Unrepresentable(
                "nested record reached the field formatter".to_owned(),
            )),
        }
    }

    /// Format a boolean under the configured spelling.
    #[must_use]
    pub fn format_bool(&self, v: bool) -> String {
        match &self.bools {
            BoolStrategy::Standard | BoolStrategy::Flexible => {
                if v { "true" } else { "false" }.to_owned()
            }
            BoolStrategy::Custom { truthy, falsy } => {
                let set = if v { truthy } else { falsy };
                set.first()
                    .cloned()
                    .unwrap_or_else(|| if v { "true" } else { "false" }.to_owned())
            }
        }
    }

    /// Format a float, rejecting NaN and infinities.
    pub fn format_float(&self, v: f64) -> Result<String, TypeError> {
        if !v.is_finite() {
            return Err(TypeError::Unrepresentable(format!(
                "non-finite float {v}"
            )));
        }
        // `{}` on f64 emits the shortest round-trippable base-10 text and
        // stays exponent-free for the magnitudes CSV data lives in.
        Ok(self.localize_decimal(v.to_string()))
    }

    /// Format a calendar date under the date strategy.
    #[must_use]
    pub fn format_date(&self, v: NaiveDate) -> String {
        match &self.dates {
            DateStrategy::Formatted(pattern) | DateStrategy::FlexibleHint(pattern) => {
                v.format(pattern).to_string()
            }
            DateStrategy::SecondsSinceEpoch => match v.and_hms_opt(0, 0, 0) {
                Some(dt) => dt.and_utc().timestamp().to_string(),
                None => v.format("%Y-%m-%d").to_string(),
            },
            DateStrategy::MillisSinceEpoch => match v.and_hms_opt(0, 0, 0) {
                Some(dt) => dt.and_utc().timestamp_millis().to_string(),
                None => v.format("%Y-%m-%d").to_string(),
            },
            DateStrategy::LocaleAware(tag, style) => {
                v.format(locale_render_pattern(tag, *style)).to_string()
            }
            _ => v.format("%Y-%m-%d").to_string(),
        }
    }

    /// Format a datetime under the date strategy.
    #[must_use]
    pub fn format_datetime(&self, v: NaiveDateTime) -> String {
        match &self.dates {
            DateStrategy::Formatted(pattern) | DateStrategy::FlexibleHint(pattern) => {
                v.format(pattern).to_string()
            }
            DateStrategy::SecondsSinceEpoch => v.and_utc().timestamp().to_string(),
            DateStrategy::MillisSinceEpoch => v.and_utc().timestamp_millis().to_string(),
            DateStrategy::LocaleAware(tag, style) => {
                v.format(locale_render_pattern(tag, *style)).to_string()
            }
            _ => v.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Replace the canonical `.` with the locale's decimal separator when a
    /// locale-driven number strategy is configured.
    fn localize_decimal(&self, text: String) -> String {
        match &self.numbers {
            NumberStrategy::Locale(tag)
            | NumberStrategy::ParseStrategy(tag)
            | NumberStrategy::Currency { locale: tag, .. } => {
                let (_, decimal) = crate::strategy::locale_separators(tag);
                if decimal != '.' {
                    text.replace('.', &decimal.to_string())
                } else {
                    text
                }
            }
            _ => text,
        }
    }
}

fn locale_render_pattern(tag: &str, style: LocaleStyle) -> &'static str {
    let primary = tag
        .split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_ascii_lowercase();
    let day_first = !matches!(primary.as_str(), "en" | "us");
    match (day_first, style) {
        (true, LocaleStyle::Short) => "%d/%m/%y",
        (true, LocaleStyle::Medium) => "%d %b %Y",
        (true, LocaleStyle::Long) => "%d %B %Y",
        (false, LocaleStyle::Short) => "%m/%d/%y",
        (false, LocaleStyle::Medium) => "%b %d, %Y",
        (false, LocaleStyle::Long) => "%B %d, %Y",
    }
}
