use std::str::SplitWhitespace;

/// Lowercasing whitespace tokenizer used by the text indexes.
///
/// Tokens are the whitespace-delimited runs of the normalized text, so any
/// whitespace-free substring of a value lies inside exactly one of its tokens.
/// The text index relies on that to answer `contains` from token keys.
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    pub lowercase: bool,
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        WhitespaceTokenizer { lowercase: true }
    }
}

impl WhitespaceTokenizer {
    pub fn normalize(&self, text: &str) -> String {
        if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }

    /// Split already-normalized text into tokens
    pub fn tokens<'a>(&self, normalized: &'a str) -> SplitWhitespace<'a> {
        normalized.split_whitespace()
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = self.normalize(text);
        self.tokens(&normalized).map(str::to_string).collect()
    }

    pub fn name(&self) -> &str {
        "whitespace"
    }
}

/// True when `text` contains no whitespace as understood by the tokenizer
pub fn is_single_token(text: &str) -> bool {
    !text.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace_and_lowercases() {
        let tokenizer = WhitespaceTokenizer::default();
        assert_eq!(
            tokenizer.tokenize("The  Rolling\tStones"),
            vec!["the", "rolling", "stones"]
        );
    }

    #[test]
    fn keeps_punctuation_inside_tokens() {
        let tokenizer = WhitespaceTokenizer::default();
        assert_eq!(tokenizer.tokenize("AC/DC - Live!"), vec!["ac/dc", "-", "live!"]);
    }

    #[test]
    fn single_token_detection() {
        assert!(is_single_token("queen"));
        assert!(is_single_token(""));
        assert!(!is_single_token("que en"));
    }
}
