use crate::pointer::{Pointer, PointerParseError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UriParseError {
    #[error("URI base is not a valid absolute URL")]
    InvalidBase,
    #[error("URI fragment is not a valid JSON Pointer")]
    InvalidFragment(#[from] PointerParseError),
}

/// The canonical identity of a schema node: the absolute URI of its enclosing
/// document plus a JSON-Pointer fragment locating the node within it.
///
/// A `base` of `None` stands for the anonymous default document (schemas
/// registered without an `$id`), which renders as the empty URI. Keeping the
/// fragment as a parsed [`Pointer`] rather than a string means two URIs that
/// address the same node always compare equal, whatever escaping their
/// original spellings used.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SchemaUri {
    base: Option<Url>,
    fragment: Pointer,
}

impl SchemaUri {
    pub fn new(base: Option<Url>, fragment: Pointer) -> Self {
        SchemaUri { base, fragment }
    }

    /// The root of the document identified by `base` (an empty fragment).
    pub fn document_root(base: Option<Url>) -> Self {
        SchemaUri {
            base,
            fragment: Pointer::root(),
        }
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    pub fn fragment(&self) -> &Pointer {
        &self.fragment
    }

    /// This URI with the fragment cleared: the absolute form used when
    /// reporting unresolved references.
    pub fn document(&self) -> SchemaUri {
        SchemaUri::document_root(self.base.clone())
    }
}

impl fmt::Display for SchemaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(base) = &self.base {
            write!(f, "{}", base)?;
        }

        if !self.fragment.is_root() {
            write!(f, "#{}", self.fragment)?;
        }

        Ok(())
    }
}

impl FromStr for SchemaUri {
    type Err = UriParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, fragment) = match s.split_once('#') {
            Some((base, fragment)) => (base, fragment),
            None => (s, ""),
        };

        let base = if base.is_empty() {
            None
        } else {
            Some(Url::parse(base).map_err(|_| UriParseError::InvalidBase)?)
        };

        Ok(SchemaUri {
            base,
            fragment: Pointer::parse(fragment)?,
        })
    }
}

impl From<Url> for SchemaUri {
    fn from(mut url: Url) -> Self {
        let fragment = url
            .fragment()
            .and_then(|f| Pointer::parse(f).ok())
            .unwrap_or_default();
        url.set_fragment(None);

        SchemaUri {
            base: Some(url),
            fragment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_uri() {
        let uri: SchemaUri = "".parse().unwrap();
        assert_eq!(SchemaUri::default(), uri);
        assert_eq!("", uri.to_string());
    }

    #[test]
    fn fragment_only() {
        let uri: SchemaUri = "#/a/b".parse().unwrap();
        assert_eq!(None, uri.base());
        assert_eq!(&["a", "b"], uri.fragment().tokens());
        assert_eq!("#/a/b", uri.to_string());
    }

    #[test]
    fn absolute_with_fragment() {
        let uri: SchemaUri = "urn:example:foo#/bar".parse().unwrap();
        assert_eq!("urn:example:foo", uri.base().unwrap().as_str());
        assert_eq!("urn:example:foo#/bar", uri.to_string());
        assert_eq!("urn:example:foo", uri.document().to_string());
    }

    #[test]
    fn rejects_relative_base() {
        assert_eq!(
            Err(UriParseError::InvalidBase),
            "relative/path#/a".parse::<SchemaUri>()
        );
    }

    #[test]
    fn from_url_splits_fragment() {
        let uri = SchemaUri::from(Url::parse("http://example.com/root.json#/definitions/a").unwrap());
        assert_eq!("http://example.com/root.json", uri.base().unwrap().as_str());
        assert_eq!(&["definitions", "a"], uri.fragment().tokens());
    }
}
