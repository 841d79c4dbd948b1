//! Decode and encode configuration.

use hashbrown::HashMap;

use fastcsv_io::TextEncoding;
use fastcsv_scan::LineTerminator;
use fastcsv_types::{
    BoolStrategy, DateStrategy, KeyStrategy, NestedStrategy, NilStrategy, NumberStrategy,
};

/// Parsing discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Tolerate RFC 4180 violations where a sensible reading exists
    /// (default).
    #[default]
    Lenient,
    /// Reject quote-in-unquoted, stray bytes after a closing quote, and
    /// field-count mismatches.
    Strict,
}

/// Options controlling decode behavior.
///
/// ```rust
/// use fastcsv_engine::{DecodeOptions, ParseMode};
///
/// let options = DecodeOptions::new()
///     .delimiter(b';')
///     .mode(ParseMode::Strict)
///     .trim_whitespace(true);
/// ```
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Field delimiter, a single ASCII byte (default `,`).
    pub delimiter: u8,
    /// Whether the first row is a header row (default true).
    pub has_headers: bool,
    /// Lenient or strict parsing (default lenient).
    pub mode: ParseMode,
    /// Trim ASCII whitespace from unescaped field strings (default false).
    pub trim_whitespace: bool,
    /// Source encoding (default UTF-8). Non-ASCII-compatible encodings
    /// force a one-time transcode before parsing.
    pub encoding: TextEncoding,
    /// Absent-value strategy.
    pub nil: NilStrategy,
    /// Boolean spelling strategy.
    pub bools: BoolStrategy,
    /// Numeric separator/symbol strategy.
    pub numbers: NumberStrategy,
    /// Date interpretation strategy.
    pub dates: DateStrategy,
    /// Header-name to field-name transform.
    pub keys: KeyStrategy,
    /// Explicit header-name to field-name overrides.
    pub column_mapping: HashMap<String, String>,
    /// Explicit column-index to field-name overrides (highest precedence).
    pub index_mapping: HashMap<usize, String>,
    /// Nested record handling.
    pub nested: NestedStrategy,
    /// Exact field count enforced in strict mode.
    pub expected_field_count: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            mode: ParseMode::Lenient,
            trim_whitespace: false,
            encoding: TextEncoding::Utf8,
            nil: NilStrategy::default(),
            bools: BoolStrategy::default(),
            numbers: NumberStrategy::default(),
            dates: DateStrategy::default(),
            keys: KeyStrategy::default(),
            column_mapping: HashMap::new(),
            index_mapping: HashMap::new(),
            nested: NestedStrategy::default(),
            expected_field_count: None,
        }
    }
}

impl DecodeOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter byte.
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the first row is a header row.
    #[must_use]
    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Set the parsing discipline.
    #[must_use]
    pub fn mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Trim ASCII whitespace from field strings before value parsing.
    #[must_use]
    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    /// Set the source encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the absent-value strategy.
    #[must_use]
    pub fn nil_strategy(mut self, nil: NilStrategy) -> Self {
        self.nil = nil;
        self
    }

    /// Set the boolean spelling strategy.
    #[must_use]
    pub fn bool_strategy(mut self, bools: BoolStrategy) -> Self {
        self.bools = bools;
        self
    }

    /// Set the numeric strategy.
    #[must_use]
    pub fn number_strategy(mut self, numbers: NumberStrategy) -> Self {
        self.numbers = numbers;
        self
    }

    /// Set the date strategy.
    #[must_use]
    pub fn date_strategy(mut self, dates: DateStrategy) -> Self {
        self.dates = dates;
        self
    }

    /// Set the header-name transform.
    #[must_use]
    pub fn key_strategy(mut self, keys: KeyStrategy) -> Self {
        self.keys = keys;
        self
    }

    /// Map a header name to a field name explicitly.
    #[must_use]
    pub fn map_column(mut self, header: impl Into<String>, field: impl Into<String>) -> Self {
        self.column_mapping.insert(header.into(), field.into());
        self
    }

    /// Map a column index to a field name explicitly (highest precedence).
    #[must_use]
    pub fn map_index(mut self, index: usize, field: impl Into<String>) -> Self {
        self.index_mapping.insert(index, field.into());
        self
    }

    /// Set the nested record strategy.
    #[must_use]
    pub fn nested_strategy(mut self, nested: NestedStrategy) -> Self {
        self.nested = nested;
        self
    }

    /// Enforce an exact field count (strict mode only).
    #[must_use]
    pub fn expected_field_count(mut self, count: usize) -> Self {
        self.expected_field_count = Some(count);
        self
    }
}

/// Options controlling encode behavior.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Field delimiter (default `,`).
    pub delimiter: u8,
    /// Whether to write a header row (default true).
    pub has_headers: bool,
    /// Output row terminator (default LF).
    pub line_ending: LineTerminator,
    /// Field-name to header-name transform for the header row.
    pub keys: KeyStrategy,
    /// Boolean rendering strategy.
    pub bools: BoolStrategy,
    /// Numeric rendering strategy.
    pub numbers: NumberStrategy,
    /// Date rendering strategy.
    pub dates: DateStrategy,
    /// Text written for absent values (default empty).
    pub nil_repr: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            line_ending: LineTerminator::Lf,
            keys: KeyStrategy::default(),
            bools: BoolStrategy::default(),
            numbers: NumberStrategy::default(),
            dates: DateStrategy::default(),
            nil_repr: String::new(),
        }
    }
}

impl EncodeOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter byte.
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether a header row is written.
    #[must_use]
    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Set the output row terminator.
    #[must_use]
    pub fn line_ending(mut self, line_ending: LineTerminator) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set the field-name to header-name transform.
    #[must_use]
    pub fn key_strategy(mut self, keys: KeyStrategy) -> Self {
        self.keys = keys;
        self
    }

    /// Set the boolean rendering strategy.
    #[must_use]
    pub fn bool_strategy(mut self, bools: BoolStrategy) -> Self {
        self.bools = bools;
        self
    }

    /// Set the numeric rendering strategy.
    #[must_use]
    pub fn number_strategy(mut self, numbers: NumberStrategy) -> Self {
        self.numbers = numbers;
        self
    }

    /// Set the date rendering strategy.
    #[must_use]
    pub fn date_strategy(mut self, dates: DateStrategy) -> Self {
        self.dates = dates;
        self
    }

    /// Set the text written for absent values.
    #[must_use]
    pub fn nil_repr(mut self, repr: impl Into<String>) -> Self {
        self.nil_repr = repr.into();
        self
    }
}

/// Minimum parallel-decode chunk size.
pub const MIN_CHUNK_SIZE: usize = 64 * 1024;

/// Parallel decode configuration.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Worker pool size (default: available parallelism).
    pub parallelism: usize,
    /// Target chunk size in bytes (default 1 MiB, minimum 64 KiB).
    pub chunk_size_bytes: usize,
    /// Emit records in source order (default true).
    pub preserve_order: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism().map_or(4, usize::from),
            chunk_size_bytes: 1 << 20,
            preserve_order: true,
        }
    }
}

impl ParallelConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool size (clamped to at least 1).
    #[must_use]
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the target chunk size (clamped to at least 64 KiB).
    #[must_use]
    pub fn chunk_size_bytes(mut self, bytes: usize) -> Self {
        self.chunk_size_bytes = bytes.max(MIN_CHUNK_SIZE);
        self
    }

    /// Set whether output preserves source order.
    #[must_use]
    pub fn preserve_order(mut self, preserve: bool) -> Self {
        self.preserve_order = preserve;
        self
    }
}

/// Parallel encode configuration.
#[derive(Debug, Clone)]
pub struct ParallelEncodeConfig {
    /// Worker pool size (default: available parallelism).
    pub parallelism: usize,
    /// Records per chunk (default 8192).
    pub chunk_rows: usize,
    /// Sink buffer capacity in bytes (default 256 KiB).
    pub buffer_bytes: usize,
}

impl Default for ParallelEncodeConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism().map_or(4, usize::from),
            chunk_rows: 8192,
            buffer_bytes: 256 * 1024,
        }
    }
}

impl ParallelEncodeConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool size (clamped to at least 1).
    #[must_use]
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set records per chunk (clamped to at least 1).
    #[must_use]
    pub fn chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows.max(1);
        self
    }

    /// Set the sink buffer capacity.
    #[must_use]
    pub fn buffer_bytes(mut self, bytes: usize) -> Self {
        self.buffer_bytes = bytes.max(1);
        self
    }
}

/// Memory budget for streaming decode.
///
/// The budget and estimated row size derive a row cap; watermark fractions
/// turn the cap into a high/low hysteresis band for the backpressure
/// controller.
#[derive(Debug, Clone)]
pub struct MemoryLimit {
    /// Total buffered-row budget in bytes (default 64 MiB).
    pub budget_bytes: usize,
    /// Estimated decoded row size in bytes (default 256).
    pub estimated_row_bytes: usize,
    /// Rows produced per batch (default 1024).
    pub batch_size: usize,
    /// Use high/low watermarks instead of a hard cap (default true).
    pub use_watermarks: bool,
    /// High watermark as a fraction of `max_rows`, in `[0.5, 1.0]`
    /// (default 0.9).
    pub high_frac: f64,
    /// Low watermark as a fraction of `max_rows`, below `high_frac`
    /// (default 0.5).
    pub low_frac: f64,
}

impl Default for MemoryLimit {
    fn default() -> Self {
        Self {
            budget_bytes: 64 << 20,
            estimated_row_bytes: 256,
            batch_size: 1024,
            use_watermarks: true,
            high_frac: 0.9,
            low_frac: 0.5,
        }
    }
}

impl MemoryLimit {
    /// Create a limit with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffered-row budget in bytes.
    #[must_use]
    pub fn budget_bytes(mut self, bytes: usize) -> Self {
        self.budget_bytes = bytes.max(1);
        self
    }

    /// Set the estimated decoded row size.
    #[must_use]
    pub fn estimated_row_bytes(mut self, bytes: usize) -> Self {
        self.estimated_row_bytes = bytes.max(1);
        self
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows.max(1);
        self
    }

    /// Toggle watermark hysteresis (off means a hard cap at `max_rows`).
    #[must_use]
    pub fn use_watermarks(mut self, on: bool) -> Self {
        self.use_watermarks = on;
        self
    }

    /// Set the high watermark fraction (clamped to `[0.5, 1.0]`).
    #[must_use]
    pub fn high_frac(mut self, frac: f64) -> Self {
        self.high_frac = frac.clamp(0.5, 1.0);
        self
    }

    /// Set the low watermark fraction (clamped below the high fraction).
    #[must_use]
    pub fn low_frac(mut self, frac: f64) -> Self {
        self.low_frac = frac.clamp(0.0, 1.0);
        self
    }

    /// Maximum buffered rows under the budget.
    #[must_use]
    pub fn max_rows(&self) -> usize {
        (self.budget_bytes / self.estimated_row_bytes).max(1)
    }

    /// High watermark in rows.
    #[must_use]
    pub fn high_rows(&self) -> usize {
        let frac = self.high_frac.clamp(0.5, 1.0);
        ((self.max_rows() as f64 * frac) as usize).max(1)
    }

    /// Low watermark in rows (always below the high watermark).
    #[must_use]
    pub fn low_rows(&self) -> usize {
        let frac = self.low_frac.min(self.high_frac);
        ((self.max_rows() as f64 * frac) as usize).min(self.high_rows().saturating_sub(1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_defaults() {
        let options = DecodeOptions::default();
        assert_eq!(options.delimiter, b',');
        assert!(options.has_headers);
        assert_eq!(options.mode, ParseMode::Lenient);
        assert!(!options.trim_whitespace);
        assert!(options.expected_field_count.is_none());
    }

    #[test]
    fn test_decode_builder_chain() {
        let options = DecodeOptions::new()
            .delimiter(b'\t')
            .has_headers(false)
            .mode(ParseMode::Strict)
            .map_column("User Name", "user_name")
            .map_index(0, "id")
            .expected_field_count(3);
        assert_eq!(options.delimiter, b'\t');
        assert_eq!(options.column_mapping["User Name"], "user_name");
        assert_eq!(options.index_mapping[&0], "id");
        assert_eq!(options.expected_field_count, Some(3));
    }

    #[test]
    fn test_parallel_config_clamps() {
        let config = ParallelConfig::new().parallelism(0).chunk_size_bytes(1);
        assert_eq!(config.parallelism, 1);
        assert_eq!(config.chunk_size_bytes, MIN_CHUNK_SIZE);
    }

    #[test]
    fn test_memory_limit_derivations() {
        let limit = MemoryLimit::new()
            .budget_bytes(1024 * 256)
            .estimated_row_bytes(256)
            .high_frac(0.9)
            .low_frac(0.5);
        assert_eq!(limit.max_rows(), 1024);
        assert_eq!(limit.high_rows(), 921);
        assert_eq!(limit.low_rows(), 512);
        assert!(limit.low_rows() < limit.high_rows());
    }

    #[test]
    fn test_memory_limit_frac_clamps() {
        let limit = MemoryLimit::new().high_frac(0.1).low_frac(2.0);
        assert!(limit.high_frac >= 0.5);
        assert!(limit.low_rows() < limit.high_rows());
    }
}
