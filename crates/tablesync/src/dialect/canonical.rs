//! Canonical type and default vocabulary for schema comparison.
//!
//! Live catalogs report types and defaults in engine-specific spellings
//! (`tinyint(1)`, `character varying`, `'abc'::character varying`, `1`).
//! Both sides of a comparison are mapped onto the forms below first, so the
//! differ only ever compares canonical values:
//!
//! ```text
//! definition      →  CanonicalType  ←  live catalog
//! serial          →     Integer     ←  int(11)         (MySQL)
//! varchar(100)    →  Varchar(100)   ←  character varying, 100 (PostgreSQL)
//! ```

use crate::core::schema::ColumnType;

/// Canonical type representation used for equivalence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalType {
    Boolean,
    Date,
    Double,
    /// Integers of any display width; serial columns land here too.
    Integer,
    /// Variable-length string; `None` when the catalog reports no length.
    Varchar(Option<u32>),
    Text,
    Time,
    Timestamp,
    /// Anything outside the definition vocabulary, kept verbatim.
    Other(String),
}

impl CanonicalType {
    /// Canonical form of a definition type.
    pub fn of(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Boolean => CanonicalType::Boolean,
            ColumnType::Date => CanonicalType::Date,
            ColumnType::DoublePrecision => CanonicalType::Double,
            ColumnType::Integer | ColumnType::Serial => CanonicalType::Integer,
            ColumnType::Varchar(size) => CanonicalType::Varchar(Some(*size)),
            ColumnType::Text => CanonicalType::Text,
            ColumnType::Time => CanonicalType::Time,
            ColumnType::Timestamp => CanonicalType::Timestamp,
        }
    }

    /// Whether a live column of this canonical type satisfies `desired`.
    pub fn satisfies(&self, desired: &ColumnType) -> bool {
        *self == CanonicalType::of(desired)
    }
}

/// Map a MySQL `SHOW COLUMNS` type onto the canonical vocabulary.
///
/// `data_type` is the type head without size (`varchar`, `tinyint`,
/// `int unsigned` is accepted too); `size` is the parenthesized length.
pub fn normalize_mysql(data_type: &str, size: u32) -> CanonicalType {
    let lowered = data_type.trim().to_lowercase();
    let head = lowered.split_whitespace().next().unwrap_or("");
    match head {
        "tinyint" | "bool" | "boolean" => CanonicalType::Boolean,
        "varchar" => CanonicalType::Varchar((size > 0).then_some(size)),
        "text" => CanonicalType::Text,
        "date" => CanonicalType::Date,
        "time" => CanonicalType::Time,
        "timestamp" => CanonicalType::Timestamp,
        h if h.starts_with("double") => CanonicalType::Double,
        h if h.starts_with("int") => CanonicalType::Integer,
        _ => CanonicalType::Other(lowered),
    }
}

/// Map a PostgreSQL `information_schema.columns.data_type` onto the
/// canonical vocabulary. `size` is `character_maximum_length` (0 if null).
pub fn normalize_postgres(data_type: &str, size: u32) -> CanonicalType {
    let lowered = data_type.trim().to_lowercase();
    match lowered.as_str() {
        "boolean" => CanonicalType::Boolean,
        "character varying" => CanonicalType::Varchar((size > 0).then_some(size)),
        "text" => CanonicalType::Text,
        "date" => CanonicalType::Date,
        "double precision" => CanonicalType::Double,
        "integer" => CanonicalType::Integer,
        "time" | "time without time zone" => CanonicalType::Time,
        "timestamp" | "timestamp without time zone" => CanonicalType::Timestamp,
        _ => CanonicalType::Other(lowered),
    }
}

const TIME_FUNCTIONS: [&str; 4] = [
    "current_timestamp",
    "current_date",
    "current_time",
    "localtimestamp",
];

/// Normalize a default expression from either side of a comparison.
///
/// - `NULL` and absent defaults become `None`
/// - an empty or blank value is kept verbatim: MySQL reports `DEFAULT ''`
///   as an empty string, not as a quoted literal
/// - surrounding single quotes are removed (and `''` unescaped)
/// - a PostgreSQL `::type` cast after the literal is dropped
/// - unquoted `true`/`false` become `1`/`0`
/// - time functions are lowercased without their `()`, and `now()` is
///   spelled `current_timestamp`
pub fn normalize_default(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let mut value = raw.trim();
    if value.is_empty() {
        return Some(raw.to_string());
    }
    if value.eq_ignore_ascii_case("null") {
        return None;
    }

    if let Some(rest) = value.strip_prefix('\'') {
        // Quoted literal, possibly followed by a cast.
        if let Some(end) = closing_quote(rest) {
            return Some(rest[..end].replace("''", "'"));
        }
        return Some(value.to_string());
    }

    if let Some(cast) = value.find("::") {
        value = value[..cast].trim();
    }
    if let Some(inner) = value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        value = inner.trim();
    }

    let lowered = value.to_lowercase();
    match lowered.as_str() {
        "true" => return Some("1".to_string()),
        "false" => return Some("0".to_string()),
        "null" => return None,
        _ => {}
    }

    let bare = lowered.trim_end_matches("()");
    if bare == "now" {
        return Some("current_timestamp".to_string());
    }
    if TIME_FUNCTIONS.contains(&bare) {
        return Some(bare.to_string());
    }

    Some(value.to_string())
}

/// Index of the quote closing a literal whose opening quote was stripped.
fn closing_quote(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Whether a desired default and a live default denote the same value.
///
/// Numeric values compare numerically, so `0` matches `0.00`.
pub fn defaults_match(desired: Option<&str>, live: Option<&str>) -> bool {
    match (normalize_default(desired), normalize_default(live)) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if a == b {
                return true;
            }
            match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(x), Ok(y)) => x == y,
                _ => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_equivalences() {
        assert!(normalize_mysql("tinyint", 1).satisfies(&ColumnType::Boolean));
        assert!(normalize_mysql("varchar", 100).satisfies(&ColumnType::Varchar(100)));
        assert!(!normalize_mysql("varchar", 50).satisfies(&ColumnType::Varchar(100)));
        assert!(normalize_mysql("double", 0).satisfies(&ColumnType::DoublePrecision));
        assert!(normalize_mysql("int", 11).satisfies(&ColumnType::Integer));
        assert!(normalize_mysql("int unsigned", 10).satisfies(&ColumnType::Serial));
        assert!(normalize_mysql("timestamp", 0).satisfies(&ColumnType::Timestamp));
    }

    #[test]
    fn test_mysql_unknown_types_never_match() {
        let bigint = normalize_mysql("bigint", 20);
        assert_eq!(bigint, CanonicalType::Other("bigint".to_string()));
        assert!(!bigint.satisfies(&ColumnType::Integer));
        assert!(!normalize_mysql("datetime", 0).satisfies(&ColumnType::Timestamp));
    }

    #[test]
    fn test_postgres_equivalences() {
        assert!(normalize_postgres("character varying", 30).satisfies(&ColumnType::Varchar(30)));
        assert!(normalize_postgres("integer", 0).satisfies(&ColumnType::Serial));
        assert!(normalize_postgres("time without time zone", 0).satisfies(&ColumnType::Time));
        assert!(normalize_postgres("timestamp without time zone", 0)
            .satisfies(&ColumnType::Timestamp));
        assert!(!normalize_postgres("timestamp with time zone", 0)
            .satisfies(&ColumnType::Timestamp));
        assert_eq!(
            normalize_postgres("character varying", 0),
            CanonicalType::Varchar(None)
        );
    }

    #[test]
    fn test_normalize_default_forms() {
        assert_eq!(normalize_default(None), None);
        assert_eq!(normalize_default(Some("NULL")), None);
        assert_eq!(normalize_default(Some("'abc'")).as_deref(), Some("abc"));
        assert_eq!(normalize_default(Some("'O''Brien'")).as_deref(), Some("O'Brien"));
        assert_eq!(
            normalize_default(Some("'abc'::character varying")).as_deref(),
            Some("abc")
        );
        assert_eq!(normalize_default(Some("true")).as_deref(), Some("1"));
        assert_eq!(normalize_default(Some("FALSE")).as_deref(), Some("0"));
        assert_eq!(
            normalize_default(Some("CURRENT_TIMESTAMP")).as_deref(),
            Some("current_timestamp")
        );
        assert_eq!(
            normalize_default(Some("current_timestamp()")).as_deref(),
            Some("current_timestamp")
        );
        assert_eq!(normalize_default(Some("(0)::double precision")).as_deref(), Some("0"));
        assert_eq!(normalize_default(Some("now()")).as_deref(), Some("current_timestamp"));
    }

    #[test]
    fn test_boolean_defaults_match_numeric_live_values() {
        assert!(defaults_match(Some("true"), Some("1")));
        assert!(defaults_match(Some("false"), Some("0")));
        assert!(!defaults_match(Some("true"), Some("0")));
        assert!(defaults_match(Some("false"), Some("false")));
    }

    #[test]
    fn test_empty_string_default_matches_mysql_catalog() {
        assert_eq!(normalize_default(Some("")).as_deref(), Some(""));
        assert!(defaults_match(Some("''"), Some("")));
        assert!(defaults_match(Some("''"), Some("''::character varying")));
        assert!(!defaults_match(None, Some("")));
        assert!(!defaults_match(Some("''"), None));
    }

    #[test]
    fn test_blank_default_keeps_its_spaces() {
        assert_eq!(normalize_default(Some(" ")).as_deref(), Some(" "));
        assert!(defaults_match(Some("' '"), Some(" ")));
        assert!(!defaults_match(Some("' '"), Some("")));
        assert!(!defaults_match(Some("''"), Some("  ")));
    }

    #[test]
    fn test_defaults_match_quoting_and_numbers() {
        assert!(defaults_match(Some("'ES'"), Some("ES")));
        assert!(!defaults_match(Some("'ES'"), Some("es")));
        assert!(defaults_match(Some("0"), Some("0.00")));
        assert!(defaults_match(None, Some("NULL")));
        assert!(!defaults_match(Some("0"), None));
        assert!(!defaults_match(None, Some("0")));
    }
}
