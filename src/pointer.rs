use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerParseError {
    #[error("json pointer must be empty or start with '/'")]
    NotAbsolute,
}

/// An RFC 6901 JSON Pointer, held as an ordered list of unescaped tokens.
///
/// The empty pointer addresses the whole document. Tokens are stored in their
/// unescaped form; escaping only happens when rendering with [`Display`] and
/// unescaping only when parsing, so `Pointer::parse(p.to_string())` always
/// round-trips.
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The empty pointer, addressing the root of a document.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Pointer { tokens }
    }

    /// Parses a pointer string: `""` is the root, anything else must start
    /// with `/`.
    ///
    /// ```
    /// use jsv::Pointer;
    ///
    /// let ptr: Pointer = "/a~1b/~0k/0".parse().unwrap();
    /// assert_eq!(&["a/b", "~k", "0"], ptr.tokens());
    /// ```
    pub fn parse(pointer: &str) -> Result<Self, PointerParseError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }

        if !pointer.starts_with('/') {
            return Err(PointerParseError::NotAbsolute);
        }

        Ok(Pointer {
            tokens: pointer.split('/').skip(1).map(unescape_token).collect(),
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Walks `value` token by token. Objects are indexed by member name,
    /// arrays by decimal offset. Returns `None` as soon as a token fails to
    /// address anything.
    pub fn eval<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for token in &self.tokens {
            current = match current {
                Value::Object(members) => members.get(token)?,
                Value::Array(elements) => elements.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape_token(token))?;
        }

        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = PointerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

impl From<Vec<String>> for Pointer {
    fn from(tokens: Vec<String>) -> Self {
        Pointer::from_tokens(tokens)
    }
}

fn unescape_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_owned();
    }
    token.replace("~1", "/").replace("~0", "~")
}

fn escape_token(token: &str) -> String {
    if !token.contains('~') && !token.contains('/') {
        return token.to_owned();
    }
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_root() {
        assert_eq!(Pointer::root(), Pointer::parse("").unwrap());
        assert!(Pointer::parse("").unwrap().is_root());
    }

    #[test]
    fn parse_rejects_relative() {
        assert_eq!(Err(PointerParseError::NotAbsolute), Pointer::parse("a/b"));
    }

    #[test]
    fn parse_empty_token() {
        assert_eq!(&[""], Pointer::parse("/").unwrap().tokens());
    }

    #[test]
    fn parse_unescapes() {
        let ptr = Pointer::parse("/a~1b/~0k/0").unwrap();
        assert_eq!(&["a/b", "~k", "0"], ptr.tokens());
    }

    #[test]
    fn display_escapes() {
        let ptr = Pointer::from_tokens(vec!["a/b".into(), "~k".into(), "0".into()]);
        assert_eq!("/a~1b/~0k/0", ptr.to_string());
    }

    #[test]
    fn round_trip() {
        for raw in ["", "/", "/foo", "/foo/0", "/a~1b/~0k", "/~01"] {
            let ptr = Pointer::parse(raw).unwrap();
            assert_eq!(raw, ptr.to_string());
            assert_eq!(ptr, Pointer::parse(&ptr.to_string()).unwrap());
        }
    }

    #[test]
    fn eval_objects_and_arrays() {
        let value = json!({"foo": [{"bar": 1}, {"a/b": 2}]});

        let eval = |raw: &str| Pointer::parse(raw).unwrap().eval(&value).cloned();

        assert_eq!(Some(value.clone()), eval(""));
        assert_eq!(Some(json!(1)), eval("/foo/0/bar"));
        assert_eq!(Some(json!(2)), eval("/foo/1/a~1b"));
        assert_eq!(None, eval("/foo/2"));
        assert_eq!(None, eval("/foo/bar"));
        assert_eq!(None, eval("/foo/0/bar/baz"));
    }
}
