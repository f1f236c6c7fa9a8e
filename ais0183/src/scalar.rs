//! Opportunistic coercion of loosely typed feed metadata.

use std::fmt;

use serde::Serialize;

/// A metadata value that may or may not be numeric.
///
/// Receiver metadata fields (USCG suffix tokens, TAG BLOCK tags) are plain
/// text on the wire but numeric in practice. A fixed list of fields per
/// dialect is run through [`maybe_to_number`]; everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Try an integer parse, then a float parse, else keep the original text.
pub fn maybe_to_number(raw: &str) -> Scalar {
    if let Ok(v) = raw.parse::<i64>() {
        return Scalar::Int(v);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return Scalar::Float(v);
    }
    Scalar::Text(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer() {
        assert_eq!(maybe_to_number("42"), Scalar::Int(42));
        assert_eq!(maybe_to_number("-95"), Scalar::Int(-95));
        assert_eq!(maybe_to_number("0"), Scalar::Int(0));
    }

    #[test]
    fn test_float() {
        assert_eq!(maybe_to_number("161344.00"), Scalar::Float(161344.0));
        assert_eq!(maybe_to_number("44.03018211"), Scalar::Float(44.03018211));
    }

    #[test]
    fn test_text() {
        assert_eq!(
            maybe_to_number("r003669945"),
            Scalar::Text("r003669945".to_string())
        );
        assert_eq!(maybe_to_number(""), Scalar::Text(String::new()));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Scalar::Int(7).as_f64(), Some(7.0));
        assert_eq!(Scalar::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Scalar::Text("x".into()).as_f64(), None);
        assert_eq!(Scalar::Int(7).as_i64(), Some(7));
        assert_eq!(Scalar::Text("x".into()).as_text(), Some("x"));
    }
}
