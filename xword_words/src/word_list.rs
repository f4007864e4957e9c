use std::collections::HashMap;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

/// Identifier of a word in a `WordList`, assigned in first-occurrence order.
pub type WordId = usize;

static WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]+$").unwrap());

/// Deduplicated candidate words, canonicalized to lowercase ascii and bucketed
/// by length. Entries that aren't purely alphabetic are skipped, so every
/// stored letter is in `a..=z`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordList {
  words: Vec<String>,
  by_length: HashMap<u32, Vec<WordId>>,
}

impl WordList {
  fn canonicalize_word(word: &str) -> String {
    word.trim().to_ascii_lowercase()
  }

  pub fn from_words<S: AsRef<str>>(words: impl IntoIterator<Item = S>) -> Self {
    let words: Vec<_> = words
      .into_iter()
      .map(|word| Self::canonicalize_word(word.as_ref()))
      .filter(|word| WORD_REGEX.is_match(word))
      .unique()
      .collect();
    let by_length = words
      .iter()
      .enumerate()
      .fold(HashMap::<_, Vec<_>>::new(), |mut by_length, (id, word)| {
        by_length.entry(word.len() as u32).or_default().push(id);
        by_length
      });
    Self { words, by_length }
  }

  /// Reads one candidate word per line.
  pub fn parse(text: &str) -> Self {
    Self::from_words(text.lines())
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn word(&self, id: WordId) -> &str {
    &self.words[id]
  }

  pub fn bytes(&self, id: WordId) -> &[u8] {
    self.words[id].as_bytes()
  }

  /// Ids of all words of the given length, ascending.
  pub fn words_with_length(&self, length: u32) -> &[WordId] {
    self
      .by_length
      .get(&length)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  pub fn iter(&self) -> impl Iterator<Item = (WordId, &str)> {
    self
      .words
      .iter()
      .enumerate()
      .map(|(id, word)| (id, word.as_str()))
  }
}
