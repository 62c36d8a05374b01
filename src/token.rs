use serde::{Deserialize, Serialize};

/// A half-open byte span into an expression plus the text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Token {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Slice `source[start..end]` into a token.
    pub fn from_source(source: &str, start: usize, end: usize) -> Self {
        Self::new(start, end, &source[start..end])
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Same token moved by `offset` bytes.
    pub fn shifted(&self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset, self.text.clone())
    }
}

/// Tokens in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenList(Vec<Token>);

impl TokenList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, token: Token) {
        self.0.push(token);
    }

    /// Push unless a token with the same span is already present.
    pub fn push_unique(&mut self, token: Token) -> bool {
        if self.0.iter().any(|t| t.start == token.start && t.end == token.end) {
            return false;
        }
        self.0.push(token);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Token> {
        self.0.first()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.text.as_str()).collect()
    }

    /// Variant texts sorted, as used by conflict keys. The list itself is untouched.
    pub fn sorted_texts(&self) -> Vec<&str> {
        let mut texts = self.texts();
        texts.sort_unstable();
        texts
    }
}

impl From<Vec<Token>> for TokenList {
    fn from(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Deref for TokenList {
    type Target = [Token];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_texts_leaves_order() {
        let list: TokenList = vec![
            Token::new(0, 5, "hover"),
            Token::new(6, 8, "sm"),
        ]
        .into();
        assert_eq!(list.sorted_texts(), vec!["hover", "sm"]);
        assert_eq!(list.texts(), vec!["hover", "sm"]);

        let list: TokenList = vec![Token::new(0, 2, "sm"), Token::new(3, 8, "focus")].into();
        assert_eq!(list.sorted_texts(), vec!["focus", "sm"]);
        assert_eq!(list[0].text, "sm");
    }

    #[test]
    fn test_push_unique_by_span() {
        let mut list = TokenList::new();
        assert!(list.push_unique(Token::new(0, 4, "flex")));
        assert!(!list.push_unique(Token::new(0, 4, "flex")));
        assert!(list.push_unique(Token::new(5, 9, "flex")));
        assert_eq!(list.len(), 2);
    }
}
