use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `<stem>(<n>)` with an optional space before the parenthesis, n >= 1.
    static ref DUPLICATE_INDICATOR: Regex =
        Regex::new(r"^(?P<base>.*?)\s*\((?P<n>[1-9]\d*)\)$").expect("valid regex");
    static ref DATED_PREFIX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}_.+").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// A filename split into the parts used to build its dated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub canonical_base: String,
    /// Informational only; never reused as a collision counter.
    pub duplicate_indicator: Option<u32>,
    /// Includes the leading dot, or empty when the name has no extension.
    pub extension: String,
    pub already_formatted: bool,
}

impl NormalizedName {
    /// `<YYYY-MM-DD>_<base><ext>`, before any collision suffix.
    pub fn candidate(&self, date: NaiveDate) -> String {
        format!(
            "{}_{}{}",
            date.format("%Y-%m-%d"),
            self.canonical_base,
            self.extension
        )
    }
}

pub fn normalize(original_name: &str) -> NormalizedName {
    let (stem, extension) = split_extension(original_name);

    let (stripped, duplicate_indicator) = match DUPLICATE_INDICATOR.captures(stem) {
        Some(caps) => {
            let base = caps.name("base").map(|m| m.as_str()).unwrap_or_default();
            let n = caps.name("n").and_then(|m| m.as_str().parse::<u32>().ok());
            (base, n)
        }
        None => (stem, None),
    };

    let mut canonical_base = WHITESPACE.replace_all(stripped.trim(), "_").into_owned();
    if canonical_base.is_empty() {
        canonical_base = stem.to_string();
    }

    NormalizedName {
        canonical_base,
        duplicate_indicator,
        extension: extension.to_string(),
        already_formatted: is_already_formatted(original_name),
    }
}

/// True when the name already starts with a `YYYY-MM-DD_` prefix.
pub fn is_already_formatted(file_name: &str) -> bool {
    DATED_PREFIX.is_match(file_name)
}

/// Split at the last dot. A leading dot (`.profile`) is part of the stem.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}
