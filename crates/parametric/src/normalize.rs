use serde::{Deserialize, Serialize};

/// A raw cell value after cleanup. Normalization is total: any input maps to
/// exactly one of these, and parse failures fall back to `Text` rather than
/// erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum NormalizedValue {
    Numeric(f64),
    Text(String),
    Absent,
}

impl NormalizedValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            NormalizedValue::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, NormalizedValue::Absent)
    }

    /// Canonical display form used for equality checks. Numeric values render
    /// the same whether they arrived as "5", "5.0", or "5.0000".
    pub fn canonical(&self) -> String {
        match self {
            NormalizedValue::Numeric(value) => canonical_numeric(*value),
            NormalizedValue::Text(text) => text.clone(),
            NormalizedValue::Absent => "-".to_string(),
        }
    }
}

/// Caller hint when the expected type of a column is known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Any,
    Numeric,
    Text,
}

/// Converts raw cell strings into [`NormalizedValue`]s.
#[derive(Debug, Clone)]
pub struct Normalizer {
    treat_empty_as_absent: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            treat_empty_as_absent: true,
        }
    }
}

impl Normalizer {
    pub fn new(treat_empty_as_absent: bool) -> Self {
        Self {
            treat_empty_as_absent,
        }
    }

    pub fn normalize(&self, raw: &str) -> NormalizedValue {
        self.normalize_with(raw, TypeHint::Any)
    }

    pub fn normalize_with(&self, raw: &str, hint: TypeHint) -> NormalizedValue {
        let cleaned = raw.replace(['\u{feff}', '\u{200b}'], "");
        let trimmed = cleaned.trim();

        // "-" is the recorded-as-absent sentinel in exported parameter sheets.
        if trimmed == "-" {
            return NormalizedValue::Absent;
        }
        if trimmed.is_empty() {
            if self.treat_empty_as_absent {
                return NormalizedValue::Absent;
            }
            return NormalizedValue::Text(String::new());
        }

        if hint == TypeHint::Text {
            return NormalizedValue::Text(trimmed.to_string());
        }

        match parse_numeric(trimmed) {
            Some(value) => NormalizedValue::Numeric(value),
            None => NormalizedValue::Text(trimmed.to_string()),
        }
    }
}

fn parse_numeric(value: &str) -> Option<f64> {
    if let Ok(parsed) = value.parse::<f64>() {
        return finite(parsed);
    }

    // Thousands separators show up in hand-edited sheets ("1,234.5").
    if value.contains(',') {
        let stripped: String = value.chars().filter(|c| *c != ',').collect();
        if let Ok(parsed) = stripped.parse::<f64>() {
            return finite(parsed);
        }
    }

    None
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Renders a number as an integer when it is one, otherwise with at most four
/// decimal places and no trailing zeros.
pub fn canonical_numeric(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    let mut rendered = format!("{:.4}", value);
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_numbers() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.normalize("5"), NormalizedValue::Numeric(5.0));
        assert_eq!(
            normalizer.normalize(" -3.25 "),
            NormalizedValue::Numeric(-3.25)
        );
    }

    #[test]
    fn strips_thousands_separators() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.normalize("1,234.5"),
            NormalizedValue::Numeric(1234.5)
        );
    }

    #[test]
    fn dash_and_empty_are_absent() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.normalize("-"), NormalizedValue::Absent);
        assert_eq!(normalizer.normalize("   "), NormalizedValue::Absent);
    }

    #[test]
    fn empty_can_be_kept_as_text() {
        let normalizer = Normalizer::new(false);
        assert_eq!(
            normalizer.normalize(""),
            NormalizedValue::Text(String::new())
        );
    }

    #[test]
    fn unparseable_numbers_degrade_to_text() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.normalize_with("12.3.4", TypeHint::Numeric),
            NormalizedValue::Text("12.3.4".to_string())
        );
    }

    #[test]
    fn text_hint_skips_numeric_parse() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.normalize_with("0042", TypeHint::Text),
            NormalizedValue::Text("0042".to_string())
        );
    }

    #[test]
    fn canonical_forms_agree_across_spellings() {
        let normalizer = Normalizer::default();
        let a = normalizer.normalize("5");
        let b = normalizer.normalize("5.0000");
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(normalizer.normalize("2.5000").canonical(), "2.5");
    }

    #[test]
    fn zero_width_characters_are_removed() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.normalize("\u{feff}10"),
            NormalizedValue::Numeric(10.0)
        );
    }
}
