//! Whitespace tokenization.
//!
//! Tokens are the maximal non-whitespace runs of the input, in order. No
//! case folding or punctuation stripping happens here, so `"Fox"` and
//! `"fox."` are different tokens and phrase matching is case- and
//! punctuation-sensitive.

use std::ops::Index;

/// Ordered word tokens borrowed from a text body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> TokenSequence<'a> {
    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the sequence holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The tokens as a slice.
    pub fn as_slice(&self) -> &[&'a str] {
        &self.tokens
    }

    /// Iterate over every contiguous window of `n` tokens, joined by single
    /// spaces, paired with the window's start index.
    ///
    /// Yields nothing when `n` is zero or longer than the sequence.
    pub fn ngrams(&self, n: usize) -> impl Iterator<Item = (usize, String)> + '_ {
        let windows = if n == 0 || n > self.tokens.len() {
            self.tokens[..0].windows(1)
        } else {
            self.tokens.windows(n)
        };
        windows.enumerate().map(|(i, w)| (i, w.join(" ")))
    }

    /// Number of `n`-token windows in the sequence.
    pub fn ngram_count(&self, n: usize) -> usize {
        if n == 0 || n > self.tokens.len() {
            0
        } else {
            self.tokens.len() - n + 1
        }
    }
}

impl<'a> Index<usize> for TokenSequence<'a> {
    type Output = &'a str;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}

/// Split `text` into whitespace-delimited tokens.
pub fn tokenize(text: &str) -> TokenSequence<'_> {
    TokenSequence {
        tokens: text.split_whitespace().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("\n\t \r\n").is_empty());
    }

    #[test]
    fn splits_on_whitespace_runs() {
        let tokens = tokenize("  the quick\tbrown\n\nfox  ");
        assert_eq!(tokens.as_slice(), &["the", "quick", "brown", "fox"]);
    }

    #[test]
    fn keeps_case_and_punctuation() {
        let tokens = tokenize("Hello, World! hello world");
        assert_eq!(tokens.as_slice(), &["Hello,", "World!", "hello", "world"]);
        assert_ne!(tokens[0], tokens[2]);
    }

    #[test]
    fn ngrams_join_windows_with_single_spaces() {
        let tokens = tokenize("a  b\tc d");
        let grams: Vec<_> = tokens.ngrams(2).collect();
        assert_eq!(
            grams,
            vec![
                (0, "a b".to_string()),
                (1, "b c".to_string()),
                (2, "c d".to_string()),
            ]
        );
    }

    #[test]
    fn ngrams_empty_when_window_too_long() {
        let tokens = tokenize("a b c");
        assert_eq!(tokens.ngrams(4).count(), 0);
        assert_eq!(tokens.ngram_count(4), 0);
        assert_eq!(tokens.ngrams(0).count(), 0);
        assert_eq!(tokens.ngram_count(0), 0);
    }

    #[test]
    fn ngram_count_matches_iterator() {
        let tokens = tokenize("a b c d e f g");
        for n in 1..=8 {
            assert_eq!(tokens.ngram_count(n), tokens.ngrams(n).count(), "n = {n}");
        }
    }
}
