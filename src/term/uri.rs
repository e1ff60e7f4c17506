//! URI (IRI) representation

use std::fmt;

/// An absolute URI reference
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri {
    value: String,
}

impl Uri {
    /// Create a new URI
    pub fn new(value: impl Into<String>) -> Self {
        Uri { value: value.into() }
    }

    /// Get the URI as a string slice
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Whether the URI starts with a scheme (`scheme:`)
    pub fn is_absolute(&self) -> bool {
        match self.value.find(':') {
            Some(pos) if pos > 0 => {
                let scheme = &self.value[..pos];
                scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            }
            _ => false,
        }
    }

    /// Get the namespace (everything up to and including the last # or /)
    pub fn namespace(&self) -> &str {
        if let Some(pos) = self.value.rfind('#') {
            &self.value[..=pos]
        } else if let Some(pos) = self.value.rfind('/') {
            &self.value[..=pos]
        } else {
            &self.value
        }
    }

    /// Get the local name (fragment or last path segment)
    pub fn local_name(&self) -> &str {
        if let Some(pos) = self.value.rfind('#') {
            &self.value[pos + 1..]
        } else if let Some(pos) = self.value.rfind('/') {
            &self.value[pos + 1..]
        } else {
            &self.value
        }
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.value)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.value)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Uri::new(s)
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Uri::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace() {
        let uri = Uri::new("http://example.org/foo#bar");
        assert_eq!(uri.namespace(), "http://example.org/foo#");
        assert_eq!(uri.local_name(), "bar");

        let uri2 = Uri::new("http://example.org/path/name");
        assert_eq!(uri2.namespace(), "http://example.org/path/");
        assert_eq!(uri2.local_name(), "name");
    }

    #[test]
    fn test_is_absolute() {
        assert!(Uri::new("http://example.org/").is_absolute());
        assert!(Uri::new("urn:isbn:123").is_absolute());
        assert!(!Uri::new("relative/path").is_absolute());
        assert!(!Uri::new(":nothing").is_absolute());
        assert!(!Uri::new("9p://x").is_absolute());
    }
}
