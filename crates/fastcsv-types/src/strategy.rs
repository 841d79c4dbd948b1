//! Parsing and formatting strategies.
//!
//! Strategies are selected once in the decode/encode configuration and
//! consumed at the field-value boundary. They are plain cloneable values;
//! the `Custom` variants carry shared function pointers so configurations
//! stay cheap to hand to worker threads.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;

/// Which field strings decode as an absent value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NilStrategy {
    /// The empty string only (default).
    #[default]
    Empty,
    /// The empty string plus the literal `null` (case-insensitive).
    NullLiteral,
    /// A caller-provided token set, matched verbatim.
    Custom(Vec<String>),
}

impl NilStrategy {
    /// True if `s` denotes an absent value under this strategy.
    #[must_use]
    pub fn is_nil(&self, s: &str) -> bool {
        match self {
            Self::Empty => s.is_empty(),
            Self::NullLiteral => s.is_empty() || s.eq_ignore_ascii_case("null"),
            Self::Custom(tokens) => s.is_empty() || tokens.iter().any(|t| t == s),
        }
    }
}

/// Accepted boolean spellings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BoolStrategy {
    /// `true/yes/1/y/t/on` and `false/no/0/n/f/off`, case-insensitive
    /// (default).
    #[default]
    Standard,
    /// The standard set extended with a fixed multi-language token set.
    Flexible,
    /// Caller-provided truthy and falsy sets, matched case-insensitively.
    Custom {
        /// Tokens decoding to `true`.
        truthy: Vec<String>,
        /// Tokens decoding to `false`.
        falsy: Vec<String>,
    },
}

/// Standard truthy tokens.
pub const STANDARD_TRUE: &[&str] = &["true", "yes", "1", "y", "t", "on"];
/// Standard falsy tokens.
pub const STANDARD_FALSE: &[&str] = &["false", "no", "0", "n", "f", "off"];

/// Multi-language truthy tokens accepted by [`BoolStrategy::Flexible`].
pub const FLEXIBLE_TRUE: &[&str] = &[
    "ja", "oui", "si", "sì", "sim", "da", "tak", "evet", "hai", "ano", "kyllä", "igen",
];
/// Multi-language falsy tokens accepted by [`BoolStrategy::Flexible`].
pub const FLEXIBLE_FALSE: &[&str] = &[
    "nein", "non", "não", "nao", "nej", "nie", "net", "hayır", "hayir", "iie", "ne", "ei", "nem",
];

/// Numeric separator and symbol handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NumberStrategy {
    /// Strict base-10 parsing (default).
    #[default]
    Standard,
    /// Strip currency symbols and unit suffixes, then infer decimal and
    /// grouping separators from the digit layout.
    Flexible,
    /// Use the named locale's decimal and grouping separators, stripping
    /// grouping characters.
    Locale(String),
    /// Like [`NumberStrategy::Locale`] but without currency or unit
    /// stripping: separators only.
    ParseStrategy(String),
    /// Strip the given currency code/symbol (or any known symbol when
    /// `code` is `None`), then apply the locale's separators.
    Currency {
        /// ISO currency code or symbol to strip; `None` strips any known
        /// symbol.
        code: Option<String>,
        /// Locale tag driving separator interpretation.
        locale: String,
    },
}

/// Date/time interpretation.
#[derive(Clone, Default)]
pub enum DateStrategy {
    /// Leave the field as a string for later interpretation (default).
    #[default]
    Deferred,
    /// Floating-point seconds since 1970-01-01T00:00:00Z.
    SecondsSinceEpoch,
    /// Floating-point milliseconds since 1970-01-01T00:00:00Z.
    MillisSinceEpoch,
    /// RFC 3339 subset.
    Iso8601,
    /// A single chrono format pattern (POSIX locale, UTC).
    Formatted(String),
    /// A caller-provided parser.
    Custom(Arc<dyn Fn(&str) -> Option<NaiveDateTime> + Send + Sync>),
    /// Try a fixed catalog: ISO variants, day-first, month-first,
    /// time-bearing, compact, month-name forms, then `today`/`yesterday`.
    Flexible,
    /// Try the hint pattern first, then the flexible catalog.
    FlexibleHint(String),
    /// Locale-and-style-driven pattern selection.
    LocaleAware(String, LocaleStyle),
}

impl fmt::Debug for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deferred => write!(f, "Deferred"),
            Self::SecondsSinceEpoch => write!(f, "SecondsSinceEpoch"),
            Self::MillisSinceEpoch => write!(f, "MillisSinceEpoch"),
            Self::Iso8601 => write!(f, "Iso8601"),
            Self::Formatted(p) => f.debug_tuple("Formatted").field(p).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
            Self::Flexible => write!(f, "Flexible"),
            Self::FlexibleHint(p) => f.debug_tuple("FlexibleHint").field(p).finish(),
            Self::LocaleAware(tag, style) => {
                f.debug_tuple("LocaleAware").field(tag).field(style).finish()
            }
        }
    }
}

/// Date rendering width for [`DateStrategy::LocaleAware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocaleStyle {
    /// Numeric, two-digit year where customary.
    Short,
    /// Abbreviated month name (default).
    #[default]
    Medium,
    /// Full month name.
    Long,
}

/// Header-name to field-name transformation.
///
/// The canonical field naming convention is `snake_case`; each variant
/// names the convention the *headers* are written in.
#[derive(Clone, Default)]
pub enum KeyStrategy {
    /// Headers already match field names (default).
    #[default]
    Identity,
    /// `user_name` / `User_Name` headers.
    FromSnakeCase,
    /// `user-name` headers.
    FromKebabCase,
    /// `USER_NAME` headers.
    FromScreamingSnake,
    /// `UserName` or `userName` headers.
    FromPascal,
    /// Caller-provided transform.
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "Identity"),
            Self::FromSnakeCase => write!(f, "FromSnakeCase"),
            Self::FromKebabCase => write!(f, "FromKebabCase"),
            Self::FromScreamingSnake => write!(f, "FromScreamingSnake"),
            Self::FromPascal => write!(f, "FromPascal"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl KeyStrategy {
    /// Transform a header name into the canonical field-name convention.
    #[must_use]
    pub fn apply(&self, header: &str) -> String {
        match self {
            Self::Identity => header.to_owned(),
            Self::FromSnakeCase | Self::FromScreamingSnake => header.to_lowercase(),
            Self::FromKebabCase => header.replace('-', "_").to_lowercase(),
            Self::FromPascal => pascal_to_snake(header),
            Self::Custom(f) => f(header),
        }
    }

    /// Transform a field name back into the header convention (encode side).
    #[must_use]
    pub fn unapply(&self, field: &str) -> String {
        match self {
            Self::Identity | Self::FromSnakeCase => field.to_owned(),
            Self::FromKebabCase => field.replace('_', "-"),
            Self::FromScreamingSnake => field.to_uppercase(),
            Self::FromPascal => snake_to_pascal(field),
            Self::Custom(_) => field.to_owned(),
        }
    }
}

fn pascal_to_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn snake_to_pascal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for part in s.split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// How nested record fields are handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NestedStrategy {
    /// Join parent and child names with a separator (default `.`) and bind
    /// against the flattened header set.
    Flatten(String),
    /// Decode the field's text as JSON into the nested type.
    Json,
    /// Reject nested records as unsupported.
    #[default]
    Error,
}

impl NestedStrategy {
    /// The conventional flatten strategy with a `.` separator.
    #[must_use]
    pub fn flatten() -> Self {
        Self::Flatten(".".to_owned())
    }
}

/// Known currency symbols and codes, longest first so that multi-byte
/// symbols strip before their prefixes.
///
/// A static table rather than an enumeration of system locales: the set of
/// symbols that actually appear in data files is small and stable.
pub static CURRENCY_TOKENS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut tokens = vec![
        "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "SEK", "NOK", "DKK", "PLN", "BRL",
        "R$", "kr", "zł", "Kč", "€", "£", "¥", "₹", "₽", "₩", "₺", "₫", "฿", "₴", "$", "¢",
    ];
    tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));
    tokens
});

/// Decimal and grouping separators for a locale tag.
///
/// Grouping lists every byte accepted as a group separator (regular and
/// no-break space included for locales that group with spaces).
#[must_use]
pub fn locale_separators(tag: &str) -> (&'static [char], char) {
    let primary = tag
        .split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_ascii_lowercase();
    match primary.as_str() {
        "de" | "es" | "it" | "pt" | "nl" | "tr" | "id" | "da" | "el" => (&['.', '\u{a0}'], ','),
        "fr" | "ru" | "sv" | "nb" | "no" | "fi" | "pl" | "cs" | "sk" | "uk" => {
            (&[' ', '\u{a0}', '\u{202f}'], ',')
        }
        "ch" => (&['\'', '\u{a0}'], '.'),
        _ => (&[',', '\u{a0}'], '.'),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_strategies() {
        assert!(NilStrategy::Empty.is_nil(""));
        assert!(!NilStrategy::Empty.is_nil("null"));
        assert!(NilStrategy::NullLiteral.is_nil("NULL"));
        let custom = NilStrategy::Custom(vec!["N/A".to_owned(), "-".to_owned()]);
        assert!(custom.is_nil("N/A"));
        assert!(custom.is_nil(""));
        assert!(!custom.is_nil("n/a"));
    }

    #[test]
    fn test_key_strategy_apply() {
        assert_eq!(KeyStrategy::Identity.apply("userName"), "userName");
        assert_eq!(KeyStrategy::FromSnakeCase.apply("User_Name"), "user_name");
        assert_eq!(KeyStrategy::FromKebabCase.apply("user-name"), "user_name");
        assert_eq!(
            KeyStrategy::FromScreamingSnake.apply("USER_NAME"),
            "user_name"
        );
        assert_eq!(KeyStrategy::FromPascal.apply("UserName"), "user_name");
        assert_eq!(KeyStrategy::FromPascal.apply("userName"), "user_name");
    }

    #[test]
    fn test_key_strategy_unapply_roundtrip() {
        assert_eq!(KeyStrategy::FromPascal.unapply("user_name"), "UserName");
        assert_eq!(KeyStrategy::FromKebabCase.unapply("user_name"), "user-name");
        assert_eq!(
            KeyStrategy::FromScreamingSnake.unapply("user_name"),
            "USER_NAME"
        );
    }

    #[test]
    fn test_custom_key_strategy() {
        let strategy = KeyStrategy::Custom(Arc::new(|h: &str| h.trim().to_owned()));
        assert_eq!(strategy.apply("  padded  "), "padded");
    }

    #[test]
    fn test_currency_tokens_longest_first() {
        let tokens = &*CURRENCY_TOKENS;
        for pair in tokens.windows(2) {
            assert!(pair[0].len() >= pair[1].len());
        }
        assert!(tokens.contains(&"€"));
    }

    #[test]
    fn test_locale_separators() {
        assert_eq!(locale_separators("en-US").1, '.');
        assert_eq!(locale_separators("de").1, ',');
        assert_eq!(locale_separators("de-AT").1, ',');
        assert_eq!(locale_separators("fr_FR").1, ',');
        assert_eq!(locale_separators("unknown").1, '.');
    }
}
