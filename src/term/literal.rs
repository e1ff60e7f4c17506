//! Literal value representation

use std::fmt;

use crate::core::ns;

/// Datatype for a literal
///
/// Language tag and datatype URI are mutually exclusive; the variant order
/// is also the sort order (plain < language < typed).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Datatype {
    /// Plain literal (no datatype)
    Plain,
    /// Language-tagged literal
    Language(String),
    /// Typed literal with datatype URI
    Typed(String),
}

/// A literal coerced to its native value
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    String(String),
}

/// An RDF literal value
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    value: String,
    datatype: Datatype,
}

impl Literal {
    /// Create a plain literal
    pub fn plain(value: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: Datatype::Plain,
        }
    }

    /// Create a typed literal
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: Datatype::Typed(datatype.into()),
        }
    }

    /// Create a language-tagged literal
    pub fn with_language(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: Datatype::Language(lang.into().to_lowercase()),
        }
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the datatype
    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    /// Check if this is a plain literal
    pub fn is_plain(&self) -> bool {
        matches!(self.datatype, Datatype::Plain)
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        match &self.datatype {
            Datatype::Language(lang) => Some(lang),
            _ => None,
        }
    }

    /// Get the datatype URI if present
    pub fn datatype_uri(&self) -> Option<&str> {
        match &self.datatype {
            Datatype::Typed(uri) => Some(uri),
            _ => None,
        }
    }

    /// Try to parse as an integer
    pub fn as_integer(&self) -> Option<i64> {
        self.value.trim().parse().ok()
    }

    /// Try to parse as a float
    pub fn as_float(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }

    /// Try to parse as a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self.value.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Coerce the lexical form according to its XSD datatype
    ///
    /// Plain and language-tagged literals are strings. Unknown datatypes
    /// and lexical forms that do not parse give `None`.
    pub fn typed_value(&self) -> Option<TypedValue> {
        let dt = match &self.datatype {
            Datatype::Plain | Datatype::Language(_) => {
                return Some(TypedValue::String(self.value.clone()))
            }
            Datatype::Typed(dt) => dt,
        };
        let local = ns::local_name(dt, ns::XSD)?;
        match local {
            "string" | "normalizedString" | "token" | "anyURI" => {
                Some(TypedValue::String(self.value.clone()))
            }
            "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
            | "positiveInteger" | "negativeInteger" | "nonPositiveInteger" | "unsignedInt"
            | "unsignedLong" | "unsignedShort" | "unsignedByte" => {
                self.as_integer().map(TypedValue::Integer)
            }
            "decimal" | "double" | "float" => self.as_float().map(TypedValue::Decimal),
            "boolean" => self.as_boolean().map(TypedValue::Boolean),
            _ => None,
        }
    }
}

/// Escape a lexical value for quoting
pub(crate) fn escape(value: &str, out: &mut impl fmt::Write) -> fmt::Result {
    for c in value.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        escape(&self.value, f)?;
        f.write_str("\"")?;
        match &self.datatype {
            Datatype::Plain => Ok(()),
            Datatype::Language(lang) => write!(f, "@{}", lang),
            Datatype::Typed(dt) => write!(f, "^^<{}>", dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_literal() {
        let lit = Literal::plain("hello");
        assert_eq!(lit.value(), "hello");
        assert!(lit.is_plain());
        assert_eq!(format!("{}", lit), "\"hello\"");
    }

    #[test]
    fn test_typed_literal() {
        let lit = Literal::typed("42", "http://www.w3.org/2001/XMLSchema#integer");
        assert_eq!(lit.as_integer(), Some(42));
        assert_eq!(lit.typed_value(), Some(TypedValue::Integer(42)));
        assert!(!lit.is_plain());
    }

    #[test]
    fn test_lang_literal() {
        let lit = Literal::with_language("hello", "EN");
        assert_eq!(lit.language(), Some("en"));
        assert_eq!(format!("{}", lit), "\"hello\"@en");
    }

    #[test]
    fn test_typed_value_coercion() {
        let xsd = |local: &str| format!("{}{}", ns::XSD, local);

        assert_eq!(
            Literal::typed("true", xsd("boolean")).typed_value(),
            Some(TypedValue::Boolean(true))
        );
        assert_eq!(
            Literal::typed("2.5", xsd("double")).typed_value(),
            Some(TypedValue::Decimal(2.5))
        );
        assert_eq!(Literal::typed("abc", xsd("int")).typed_value(), None);
        assert_eq!(
            Literal::typed("x", "http://example.org/custom").typed_value(),
            None
        );
        assert_eq!(
            Literal::with_language("chat", "fr").typed_value(),
            Some(TypedValue::String("chat".into()))
        );
    }

    #[test]
    fn test_escaped_display() {
        let lit = Literal::plain("say \"hi\"\n");
        assert_eq!(format!("{}", lit), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn test_ordering() {
        let plain = Literal::plain("a");
        let lang = Literal::with_language("a", "en");
        let typed = Literal::typed("a", "http://example.org/dt");
        assert!(plain < lang);
        assert!(lang < typed);
        assert!(Literal::typed("a", "z") < Literal::plain("b"));
    }
}
