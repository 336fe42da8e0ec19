use shapefile::dbase::FieldValue;

/// A single attribute cell, independent of the source file format.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Null,
}

/// Attribute row in source column order. Names may repeat.
pub type Record = Vec<(String, AttrValue)>;

impl AttrValue {
    /// Render as text: trimmed strings, integral numbers without a fraction.
    pub fn to_text(&self) -> Option<String> {
        match self {
            AttrValue::Text(s) => Some(s.trim().to_string()),
            AttrValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            AttrValue::Number(n) => Some(n.to_string()),
            AttrValue::Null => None,
        }
    }
}

impl From<FieldValue> for AttrValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Character(Some(s)) => AttrValue::Text(s),
            FieldValue::Memo(s) => AttrValue::Text(s),
            FieldValue::Numeric(Some(n)) => AttrValue::Number(n),
            FieldValue::Float(Some(f)) => AttrValue::Number(f as f64),
            FieldValue::Integer(i) => AttrValue::Number(i as f64),
            FieldValue::Double(d) => AttrValue::Number(d),
            FieldValue::Currency(c) => AttrValue::Number(c),
            FieldValue::Logical(Some(b)) => AttrValue::Text(b.to_string()),
            _ => AttrValue::Null,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self { AttrValue::Text(s.to_string()) }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self { AttrValue::Number(n) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rendering() {
        assert_eq!(AttrValue::Text("  Mysore ".into()).to_text(), Some("Mysore".into()));
        assert_eq!(AttrValue::Number(612345.0).to_text(), Some("612345".into()));
        assert_eq!(AttrValue::Number(12.5).to_text(), Some("12.5".into()));
        assert_eq!(AttrValue::Null.to_text(), None);
    }

    #[test]
    fn from_dbase_values() {
        assert_eq!(AttrValue::from(FieldValue::Character(Some("A".into()))), AttrValue::Text("A".into()));
        assert_eq!(AttrValue::from(FieldValue::Numeric(Some(3.0))), AttrValue::Number(3.0));
        assert_eq!(AttrValue::from(FieldValue::Numeric(None)), AttrValue::Null);
        assert_eq!(AttrValue::from(FieldValue::Character(None)), AttrValue::Null);
    }
}
