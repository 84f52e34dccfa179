//! Field annotation mini-language
//!
//! An annotation is a comma separated list of `key` or `key=value` tokens, for example
//! `belongs_to_many,join_name=book_category`. Whitespace around tokens is ignored.

/// Parsed annotation tokens, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    tokens: Vec<(String, String)>,
}

impl Tag {
    pub fn parse(raw: &str) -> Self {
        let tokens = raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| match token.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => (token.to_string(), String::new()),
            })
            .collect();
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True if `key` appears, with or without a value
    pub fn has(&self, key: &str) -> bool {
        self.tokens.iter().any(|(k, _)| k == key)
    }

    /// First non-empty value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|(k, _)| k.as_str())
    }
}
