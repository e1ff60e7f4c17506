//! Variable representation for patterns and templates

use std::fmt;

use percent_encoding::utf8_percent_encode;

use super::LABEL_ESCAPE;

/// A named variable (`?name`)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Create a variable; a leading `?` or `$` is stripped
    pub fn new(name: impl Into<String>) -> Self {
        let mut name = name.into();
        if name.starts_with(['?', '$']) {
            name.remove(0);
        }
        Variable { name }
    }

    /// Get the variable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", utf8_percent_encode(&self.name, LABEL_ESCAPE))
    }
}

impl From<&str> for Variable {
    fn from(s: &str) -> Self {
        Variable::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable() {
        let v = Variable::new("x");
        assert_eq!(v.name(), "x");
        assert_eq!(format!("{}", v), "?x");
    }

    #[test]
    fn test_sigil_is_stripped() {
        assert_eq!(Variable::new("?x"), Variable::new("x"));
        assert_eq!(Variable::new("$x"), Variable::new("x"));
    }

    #[test]
    fn test_display_escapes_punctuation() {
        assert_eq!(Variable::new("x.y").to_string(), "?x%2Ey");
        assert_eq!(Variable::new("a_b-c").to_string(), "?a_b-c");
    }
}
