//! Strategy-driven field value parsing.
//!
//! [`ValueParser`] bundles the four value-level strategies from the decode
//! configuration and turns field strings into typed values. Parsers are
//! pure, never retain the input, and report failures as
//! [`TypeError::TypeMismatch`] with a hint when a different strategy would
//! have succeeded.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use crate::error::TypeError;
use crate::strategy::{
    BoolStrategy, CURRENCY_TOKENS, DateStrategy, FLEXIBLE_FALSE, FLEXIBLE_TRUE, LocaleStyle,
    NilStrategy, NumberStrategy, STANDARD_FALSE, STANDARD_TRUE, locale_separators,
};

/// The flexible date catalog, tried in order.
///
/// ISO variants first, then European day-first, US month-first,
/// time-bearing variants, compact digit runs, and verbose month-name
/// forms. `%Y%m%d` precedes `%d%m%Y` so that ISO-compact input does not
/// misparse as day-first (a day-first compact date fails `%Y%m%d` on the
/// month range and falls through).
static FLEXIBLE_PATTERNS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d",
        "%d/%m/%Y",
        "%d.%m.%Y",
        "%d-%m-%Y",
        "%m/%d/%Y",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%d.%m.%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y%m%d",
        "%d%m%Y",
        "%d %B %Y",
        "%B %d, %Y",
        "%d %b %Y",
        "%b %d, %Y",
    ]
});

/// Field-string parser configured with the decode strategies.
#[derive(Debug, Clone, Default)]
pub struct ValueParser {
    /// Boolean spelling strategy.
    pub bools: BoolStrategy,
    /// Numeric separator/symbol strategy.
    pub numbers: NumberStrategy,
    /// Date interpretation strategy.
    pub dates: DateStrategy,
    /// Absent-value strategy.
    pub nil: NilStrategy,
}

impl ValueParser {
    /// True if `s` denotes an absent value under the nil strategy.
    #[must_use]
    pub fn is_nil(&self, s: &str) -> bool {
        self.nil.is_nil(s)
    }

    /// Parse a boolean.
    pub fn parse_bool(&self, s: &str) -> Result<bool, TypeError> {
        let token = s.trim();
        let lowered = token.to_lowercase();
        match &self.bools {
            BoolStrategy::Standard => {
                standard_bool(&lowered).ok_or_else(|| match flexible_bool(&lowered) {
                    Some(_) => TypeError::mismatch_with_hint(
                        "bool",
                        s,
                        "the flexible bool strategy accepts this token",
                    ),
                    None => TypeError::mismatch("bool", s),
                })
            }
            BoolStrategy::Flexible => standard_bool(&lowered)
                .or_else(|| flexible_bool(&lowered))
                .ok_or_else(|| TypeError::mismatch("bool", s)),
            BoolStrategy::Custom { truthy, falsy } => {
                if truthy.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                    Ok(true)
                } else if falsy.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                    Ok(false)
                } else {
                    Err(TypeError::mismatch("bool", s))
                }
            }
        }
    }

    /// Parse a 64-bit signed integer.
    pub fn parse_int(&self, s: &str) -> Result<i64, TypeError> {
        let token = s.trim();
        match &self.numbers {
            NumberStrategy::Standard => token.parse::<i64>().map_err(|_| int_error(token)),
            _ => {
                let normalized = self.normalize_number(token)?;
                if normalized.contains('.') {
                    let f = normalized
                        .parse::<f64>()
                        .map_err(|_| TypeError::mismatch("i64", s))?;
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        Ok(f as i64)
                    } else {
                        Err(TypeError::mismatch("i64", s))
                    }
                } else {
                    normalized
                        .parse::<i64>()
                        .map_err(|_| TypeError::mismatch("i64", s))
                }
            }
        }
    }

    /// Parse a 64-bit float.
    pub fn parse_float(&self, s: &str) -> Result<f64, TypeError> {
        let token = s.trim();
        match &self.numbers {
            NumberStrategy::Standard => token.parse::<f64>().map_err(|_| float_error(token)),
            _ => {
                let normalized = self.normalize_number(token)?;
                normalized
                    .parse::<f64>()
                    .map_err(|_| TypeError::mismatch("f64", s))
            }
        }
    }

    /// Parse an exact decimal.
    pub fn parse_decimal(&self, s: &str) -> Result<Decimal, TypeError> {
        let token = s.trim();
        match &self.numbers {
            NumberStrategy::Standard => token
                .parse::<Decimal>()
                .map_err(|_| TypeError::mismatch("decimal", s)),
            _ => {
                let normalized = self.normalize_number(token)?;
                normalized
                    .parse::<Decimal>()
                    .map_err(|_| TypeError::mismatch("decimal", s))
            }
        }
    }

    /// Parse a calendar date.
    pub fn parse_date(&self, s: &str) -> Result<NaiveDate, TypeError> {
        self.parse_datetime(s).map(|dt| dt.date())
    }

    /// Parse a date and time.
    pub fn parse_datetime(&self, s: &str) -> Result<NaiveDateTime, TypeError> {
        let token = s.trim();
        match &self.dates {
            DateStrategy::Deferred => Err(TypeError::InvalidDateTime(
                "date strategy is deferred".to_owned(),
            )),
            DateStrategy::SecondsSinceEpoch => epoch_datetime(token, 1.0),
            DateStrategy::MillisSinceEpoch => epoch_datetime(token, 1e-3),
            DateStrategy::Iso8601 => DateTime::parse_from_rfc3339(token)
                .map(|dt| dt.naive_utc())
                .or_else(|_| {
                    try_pattern(token, "%Y-%m-%dT%H:%M:%S%.f")
                        .or_else(|| try_pattern(token, "%Y-%m-%d"))
                        .ok_or(())
                })
                .map_err(|_| date_error(token)),
            DateStrategy::Formatted(pattern) => {
                try_pattern(token, pattern).ok_or_else(|| date_error(token))
            }
            DateStrategy::Custom(f) => f(token).ok_or_else(|| date_error(token)),
            DateStrategy::Flexible => flexible_datetime(token).ok_or_else(|| date_error(token)),
            DateStrategy::FlexibleHint(pattern) => try_pattern(token, pattern)
                .or_else(|| flexible_datetime(token))
                .ok_or_else(|| date_error(token)),
            DateStrategy::LocaleAware(tag, style) => {
                let pattern = locale_date_pattern(tag, *style);
                try_pattern(token, pattern).ok_or_else(|| date_error(token))
            }
        }
    }

    /// Normalize a numeric token to strict base-10 form.
    ///
    /// Currency symbols and unit suffixes are stripped (strategy
    /// permitting), then decimal and grouping separators resolve per the
    /// strategy's rules.
    fn normalize_number(&self, token: &str) -> Result<String, TypeError> {
        let stripped = match &self.numbers {
            NumberStrategy::Flexible => strip_units(strip_currency(token, None)),
            NumberStrategy::Currency { code, .. } => {
                strip_units(strip_currency(token, code.as_deref()))
            }
            NumberStrategy::Locale(_) | NumberStrategy::ParseStrategy(_) => token,
            NumberStrategy::Standard => token,
        };
        let stripped = stripped.trim();

        let normalized = match &self.numbers {
            NumberStrategy::Flexible => infer_separators(stripped),
            NumberStrategy::Locale(tag)
            | NumberStrategy::ParseStrategy(tag)
            | NumberStrategy::Currency { locale: tag, .. } => {
                let (groups, decimal) = locale_separators(tag);
                let mut out = String::with_capacity(stripped.len());
                for c in stripped.chars() {
                    if groups.contains(&c) {
                        continue;
                    }
                    out.push(if c == decimal { '.' } else { c });
                }
                out
            }
            NumberStrategy::Standard => stripped.to_owned(),
        };

        // Everything outside [0-9.-] has been accounted for by now.
        let cleaned: String = normalized
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        if cleaned.is_empty() || cleaned.chars().all(|c| c == '.' || c == '-') {
            return Err(TypeError::InvalidNumber(token.to_owned()));
        }
        Ok(cleaned)
    }
}

fn standard_bool(lowered: &str) -> Option<bool> {
    if STANDARD_TRUE.contains(&lowered) {
        Some(true)
    } else if STANDARD_FALSE.contains(&lowered) {
        Some(false)
    } else {
        None
    }
}

fn flexible_bool(lowered: &str) -> Option<bool> {
    if FLEXIBLE_TRUE.contains(&lowered) {
        Some(true)
    } else if FLEXIBLE_FALSE.contains(&lowered) {
        Some(false)
    } else {
        None
    }
}

fn int_error(token: &str) -> TypeError {
    if looks_flexible_numeric(token) {
        TypeError::mismatch_with_hint(
            "i64",
            token,
            "the flexible number strategy accepts grouped or symbol-bearing numbers",
        )
    } else {
        TypeError::mismatch("i64", token)
    }
}

fn float_error(token: &str) -> TypeError {
    if looks_flexible_numeric(token) {
        TypeError::mismatch_with_hint(
            "f64",
            token,
            "the flexible number strategy accepts grouped or symbol-bearing numbers",
        )
    } else {
        TypeError::mismatch("f64", token)
    }
}

fn date_error(token: &str) -> TypeError {
    if flexible_datetime(token).is_some() {
        TypeError::mismatch_with_hint(
            "date",
            token,
            "the flexible date strategy recognizes this layout",
        )
    } else {
        TypeError::InvalidDateTime(token.to_owned())
    }
}

/// True if the token would survive flexible normalization: digits present
/// alongside separators or known symbols.
fn looks_flexible_numeric(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .any(|c| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+')
}

/// Strip a leading/trailing currency token (specific code, or any known).
fn strip_currency<'a>(token: &'a str, code: Option<&str>) -> &'a str {
    let mut out = token.trim();
    let matches_token = |s: &str, tok: &str| -> bool {
        s.eq_ignore_ascii_case(tok) || s.starts_with(tok) || s.ends_with(tok)
    };
    let mut changed = true;
    while changed {
        changed = false;
        let candidates: Vec<&str> = match code {
            Some(c) => vec![c],
            None => CURRENCY_TOKENS.iter().copied().collect(),
        };
        for tok in candidates {
            if out.len() >= tok.len() && matches_token(out, tok) {
                if let Some(rest) = out.strip_prefix(tok) {
                    out = rest.trim();
                    changed = true;
                } else if let Some(rest) = out.strip_suffix(tok) {
                    out = rest.trim();
                    changed = true;
                }
            }
        }
    }
    out
}

/// Strip a trailing unit suffix (alphabetic run or percent sign).
fn strip_units(token: &str) -> &str {
    token
        .trim_end_matches(|c: char| c.is_alphabetic() || c == '%' || c == '‰')
        .trim_end()
}

/// Resolve separators when both or either of `,` and `.` may be grouping.
fn infer_separators(token: &str) -> String {
    let last_comma = token.rfind(',');
    let last_dot = token.rfind('.');
    let mut out = String::with_capacity(token.len());
    match (last_comma, last_dot) {
        (Some(comma), Some(dot)) => {
            // The later separator is the decimal point; the other groups.
            let decimal_is_dot = dot > comma;
            for (i, c) in token.char_indices() {
                match c {
                    ',' if decimal_is_dot => {}
                    '.' if !decimal_is_dot => {}
                    ',' => out.push(if i == comma { '.' } else { '\0' }),
                    c => out.push(c),
                }
            }
            out.retain(|c| c != '\0');
        }
        (Some(comma), None) => {
            let trailing = token.len() - comma - 1;
            let single = token.matches(',').count() == 1;
            if single && trailing <= 2 {
                // One comma with at most two trailing digits: decimal.
                out.push_str(&token[..comma]);
                out.push('.');
                out.push_str(&token[comma + 1..]);
            } else {
                out.extend(token.chars().filter(|&c| c != ','));
            }
        }
        (None, Some(_)) => {
            if token.matches('.').count() > 1 {
                // Multiple dots can only be grouping.
                out.extend(token.chars().filter(|&c| c != '.'));
            } else {
                out.push_str(token);
            }
        }
        (None, None) => out.push_str(token),
    }
    // Spaces, no-break spaces, and apostrophes group in several locales.
    out.retain(|c| c != ' ' && c != '\u{a0}' && c != '\u{202f}' && c != '\'');
    out
}

/// Parse with a chrono pattern, widening a bare date to midnight.
fn try_pattern(token: &str, pattern: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(token, pattern) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(token, pattern)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn epoch_datetime(token: &str, scale: f64) -> Result<NaiveDateTime, TypeError> {
    let raw: f64 = token
        .parse()
        .map_err(|_| TypeError::InvalidDateTime(token.to_owned()))?;
    let seconds = raw * scale;
    if !seconds.is_finite() {
        return Err(TypeError::InvalidDateTime(token.to_owned()));
    }
    let secs = seconds.div_euclid(1.0) as i64;
    let nanos = (seconds.rem_euclid(1.0) * 1e9).round() as u32;
    DateTime::from_timestamp(secs, nanos.min(999_999_999))
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| TypeError::InvalidDateTime(token.to_owned()))
}

fn flexible_datetime(token: &str) -> Option<NaiveDateTime> {
    for pattern in FLEXIBLE_PATTERNS.iter() {
        if let Some(dt) = try_pattern(token, pattern) {
            return Some(dt);
        }
    }
    let lowered = token.to_ascii_lowercase();
    let today = Local::now().date_naive();
    let date = match lowered.as_str() {
        "today" => Some(today),
        "yesterday" => today.pred_opt(),
        _ => None,
    }?;
    date.and_time(NaiveTime::MIN).into()
}

/// Pattern table for [`DateStrategy::LocaleAware`].
fn locale_date_pattern(tag: &str, style: LocaleStyle) -> &'static str {
    let primary = tag
        .split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_ascii_lowercase();
    let day_first = matches!(
        primary.as_str(),
        "de" | "fr" | "es" | "it" | "pt" | "nl" | "ru" | "pl" | "sv" | "da" | "nb" | "no" | "fi"
    );
    match (day_first, style) {
        (true, LocaleStyle::Short) => "%d/%m/%y",
        (true, LocaleStyle::Medium) => "%d %b %Y",
        (true, LocaleStyle::Long) => "%d %B %Y",
        (false, LocaleStyle::Short) => "%m/%d/%y",
        (false, LocaleStyle::Medium) => "%b %d, %Y",
        (false, LocaleStyle::Long) => "%B %d, %Y",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn flexible_numbers() -> ValueParser {
        ValueParser {
            numbers: NumberStrategy::Flexible,
            ..ValueParser::default()
        }
    }

    // =========================================================================
    // Booleans
    // =========================================================================

    #[test]
    fn test_standard_bool_tokens() {
        let parser = ValueParser::default();
        for token in ["true", "YES", "1", "y", "T", "on"] {
            assert_eq!(parser.parse_bool(token).unwrap(), true, "{token}");
        }
        for token in ["false", "No", "0", "n", "f", "OFF"] {
            assert_eq!(parser.parse_bool(token).unwrap(), false, "{token}");
        }
        assert!(parser.parse_bool("maybe").is_err());
    }

    #[test]
    fn test_standard_bool_hints_at_flexible() {
        let parser = ValueParser::default();
        let err = parser.parse_bool("oui").unwrap_err();
        assert!(err.to_string().contains("flexible"));
    }

    #[test]
    fn test_flexible_bool_multilanguage() {
        let parser = ValueParser {
            bools: BoolStrategy::Flexible,
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_bool("oui").unwrap(), true);
        assert_eq!(parser.parse_bool("NEIN").unwrap(), false);
        assert_eq!(parser.parse_bool("sim").unwrap(), true);
        assert_eq!(parser.parse_bool("true").unwrap(), true);
    }

    #[test]
    fn test_custom_bool_sets() {
        let parser = ValueParser {
            bools: BoolStrategy::Custom {
                truthy: vec!["aye".to_owned()],
                falsy: vec!["nay".to_owned()],
            },
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_bool("AYE").unwrap(), true);
        assert_eq!(parser.parse_bool("nay").unwrap(), false);
        assert!(parser.parse_bool("true").is_err());
    }

    // =========================================================================
    // Numbers
    // =========================================================================

    #[test]
    fn test_standard_int() {
        let parser = ValueParser::default();
        assert_eq!(parser.parse_int("42").unwrap(), 42);
        assert_eq!(parser.parse_int("-7").unwrap(), -7);
        assert!(parser.parse_int("1,234").is_err());
    }

    #[test]
    fn test_standard_number_hints_at_flexible() {
        let parser = ValueParser::default();
        let err = parser.parse_float("€1.234,56").unwrap_err();
        assert!(err.to_string().contains("flexible"));
    }

    #[test]
    fn test_flexible_seed_cases() {
        let parser = flexible_numbers();
        assert_eq!(parser.parse_float("€1.234,56").unwrap(), 1234.56);
        assert_eq!(parser.parse_float("1,234.56").unwrap(), 1234.56);
        assert_eq!(parser.parse_float("45,50").unwrap(), 45.50);
        assert_eq!(parser.parse_int("1,234,567").unwrap(), 1_234_567);
    }

    #[test]
    fn test_flexible_currency_and_units() {
        let parser = flexible_numbers();
        assert_eq!(parser.parse_float("$99.95").unwrap(), 99.95);
        assert_eq!(parser.parse_float("12.5kg").unwrap(), 12.5);
        assert_eq!(parser.parse_float("85%").unwrap(), 85.0);
        assert_eq!(parser.parse_float("1 234,56 €").unwrap(), 1234.56);
    }

    #[test]
    fn test_flexible_single_comma_rules() {
        let parser = flexible_numbers();
        // One comma, three trailing digits: grouping.
        assert_eq!(parser.parse_int("1,234").unwrap(), 1234);
        // One comma, two trailing digits: decimal.
        assert_eq!(parser.parse_float("9,99").unwrap(), 9.99);
    }

    #[test]
    fn test_flexible_multiple_dots_are_grouping() {
        let parser = flexible_numbers();
        assert_eq!(parser.parse_int("1.234.567").unwrap(), 1_234_567);
    }

    #[test]
    fn test_flexible_negative_values() {
        let parser = flexible_numbers();
        assert_eq!(parser.parse_float("-1.234,5").unwrap(), -1234.5);
        assert_eq!(parser.parse_int("-42").unwrap(), -42);
    }

    #[test]
    fn test_flexible_rejects_symbol_only() {
        let parser = flexible_numbers();
        assert!(parser.parse_float("€").is_err());
        assert!(parser.parse_float("").is_err());
    }

    #[test]
    fn test_locale_number_parsing() {
        let parser = ValueParser {
            numbers: NumberStrategy::Locale("de".to_owned()),
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_float("1.234,56").unwrap(), 1234.56);

        let parser = ValueParser {
            numbers: NumberStrategy::Locale("fr".to_owned()),
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_float("1 234,56").unwrap(), 1234.56);
    }

    #[test]
    fn test_currency_strategy_with_code() {
        let parser = ValueParser {
            numbers: NumberStrategy::Currency {
                code: Some("EUR".to_owned()),
                locale: "de".to_owned(),
            },
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_float("EUR 1.234,56").unwrap(), 1234.56);
    }

    #[test]
    fn test_parse_decimal() {
        let parser = flexible_numbers();
        assert_eq!(
            parser.parse_decimal("€1.234,56").unwrap(),
            "1234.56".parse::<Decimal>().unwrap()
        );
    }

    // =========================================================================
    // Dates
    // =========================================================================

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso8601_strategy() {
        let parser = ValueParser {
            dates: DateStrategy::Iso8601,
            ..ValueParser::default()
        };
        assert_eq!(
            parser.parse_datetime("2024-05-17T10:30:00Z").unwrap(),
            date(2024, 5, 17).and_hms_opt(10, 30, 0).unwrap()
        );
        assert_eq!(parser.parse_date("2024-05-17").unwrap(), date(2024, 5, 17));
    }

    #[test]
    fn test_epoch_strategies() {
        let secs = ValueParser {
            dates: DateStrategy::SecondsSinceEpoch,
            ..ValueParser::default()
        };
        assert_eq!(
            secs.parse_datetime("86400").unwrap(),
            date(1970, 1, 2).and_hms_opt(0, 0, 0).unwrap()
        );
        let millis = ValueParser {
            dates: DateStrategy::MillisSinceEpoch,
            ..ValueParser::default()
        };
        assert_eq!(
            millis.parse_datetime("86400000").unwrap(),
            date(1970, 1, 2).and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_formatted_strategy() {
        let parser = ValueParser {
            dates: DateStrategy::Formatted("%d|%m|%Y".to_owned()),
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_date("17|05|2024").unwrap(), date(2024, 5, 17));
        assert!(parser.parse_date("2024-05-17").is_err());
    }

    #[test]
    fn test_flexible_catalog_order() {
        let parser = ValueParser {
            dates: DateStrategy::Flexible,
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_date("2024-05-17").unwrap(), date(2024, 5, 17));
        // Day-first wins over month-first for ambiguous slash dates.
        assert_eq!(parser.parse_date("03/04/2024").unwrap(), date(2024, 4, 3));
        // Month-first still reachable when day-first is impossible.
        assert_eq!(parser.parse_date("05/17/2024").unwrap(), date(2024, 5, 17));
        assert_eq!(parser.parse_date("20240517").unwrap(), date(2024, 5, 17));
        assert_eq!(parser.parse_date("17052024").unwrap(), date(2024, 5, 17));
        assert_eq!(
            parser.parse_date("17 May 2024").unwrap(),
            date(2024, 5, 17)
        );
        assert_eq!(
            parser.parse_date("May 17, 2024").unwrap(),
            date(2024, 5, 17)
        );
    }

    #[test]
    fn test_flexible_relative_tokens() {
        let parser = ValueParser {
            dates: DateStrategy::Flexible,
            ..ValueParser::default()
        };
        let today = Local::now().date_naive();
        assert_eq!(parser.parse_date("today").unwrap(), today);
        assert_eq!(
            parser.parse_date("Yesterday").unwrap(),
            today.pred_opt().unwrap()
        );
    }

    #[test]
    fn test_flexible_hint_tries_hint_first() {
        let parser = ValueParser {
            dates: DateStrategy::FlexibleHint("%Y/%d/%m".to_owned()),
            ..ValueParser::default()
        };
        // The hint pattern claims this layout before the catalog would.
        assert_eq!(parser.parse_date("2024/17/05").unwrap(), date(2024, 5, 17));
        // Catalog fallback still applies.
        assert_eq!(parser.parse_date("2024-05-17").unwrap(), date(2024, 5, 17));
    }

    #[test]
    fn test_custom_date_strategy() {
        let parser = ValueParser {
            dates: DateStrategy::Custom(std::sync::Arc::new(|s: &str| {
                s.strip_prefix("day+")
                    .and_then(|n| n.parse::<i64>().ok())
                    .and_then(|n| {
                        DateTime::from_timestamp(n * 86_400, 0).map(|dt| dt.naive_utc())
                    })
            })),
            ..ValueParser::default()
        };
        assert_eq!(parser.parse_date("day+1").unwrap(), date(1970, 1, 2));
        assert!(parser.parse_date("2024-05-17").is_err());
    }

    #[test]
    fn test_locale_aware_strategy() {
        let parser = ValueParser {
            dates: DateStrategy::LocaleAware("de".to_owned(), LocaleStyle::Long),
            ..ValueParser::default()
        };
        assert_eq!(
            parser.parse_date("17 May 2024").unwrap(),
            date(2024, 5, 17)
        );
    }

    #[test]
    fn test_deferred_strategy_rejects_parse() {
        let parser = ValueParser::default();
        assert!(parser.parse_datetime("2024-05-17").is_err());
    }

    #[test]
    fn test_date_error_hints_at_flexible() {
        let parser = ValueParser {
            dates: DateStrategy::Iso8601,
            ..ValueParser::default()
        };
        let err = parser.parse_date("17/05/2024").unwrap_err();
        assert!(err.to_string().contains("flexible"));
    }
}
