//! Stimulus word list and the word-selection policy.
//!
//! The word file is a delimited table with at least a `word` and a
//! `condition` column. Header names are trimmed; condition values that are
//! not whole numbers are kept as missing and never selected.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

/// One row of the word file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    /// Position of the row among the file's data rows
    pub index: usize,
    pub word: String,
    pub condition: Option<i64>,
}

/// All words of a session, in file order.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    entries: Vec<WordEntry>,
}

impl WordList {
    /// Build a list from `(word, condition)` pairs, indexed in order.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, i64)>) -> Self {
        let entries = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (word, condition))| WordEntry {
                index,
                word: word.into(),
                condition: Some(condition),
            })
            .collect();
        Self { entries }
    }

    /// Load a word file from disk.
    pub fn load(path: &Path, delimiter: u8) -> Result<Self, WordListError> {
        let file = std::fs::File::open(path)
            .map_err(|e| WordListError::IoError(format!("{}: {e}", path.display())))?;
        let list = Self::from_reader(file, delimiter)?;
        tracing::info!(path = %path.display(), words = list.len(), "word list loaded");
        Ok(list)
    }

    /// Parse a word table from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, WordListError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| WordListError::ParseError(e.to_string()))?
            .clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(WordListError::MissingColumn(name))
        };
        let word_col = column("word")?;
        let condition_col = column("condition")?;

        let mut entries = Vec::new();
        for (index, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| WordListError::ParseError(e.to_string()))?;
            let word = record.get(word_col).unwrap_or_default();
            if word.trim().is_empty() {
                tracing::warn!(row = index, "word list row has no word, skipping");
                continue;
            }

            let raw_condition = record.get(condition_col).unwrap_or_default();
            let condition = parse_condition(raw_condition);
            if condition.is_none() {
                tracing::warn!(
                    row = index,
                    word,
                    value = raw_condition,
                    "condition is not a whole number; word will never be shown"
                );
            }

            entries.push(WordEntry {
                index,
                word: word.to_string(),
                condition,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of words per condition value; `None` counts rows without a usable condition.
    pub fn count_by_condition(&self) -> BTreeMap<Option<i64>, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.condition).or_insert(0) += 1;
        }
        counts
    }
}

/// Accepts integers and integral decimals ("2", "2.0").
fn parse_condition(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Some(value as i64),
        _ => None,
    }
}

/// Draws words for a session without ever returning the same row twice.
#[derive(Debug)]
pub struct WordSelector<'a> {
    list: &'a WordList,
    used: HashSet<usize>,
}

impl<'a> WordSelector<'a> {
    pub fn new(list: &'a WordList) -> Self {
        Self {
            list,
            used: HashSet::new(),
        }
    }

    /// Words of `condition` that have not been drawn yet.
    pub fn available(&self, condition: i64) -> Vec<&'a WordEntry> {
        self.list
            .entries
            .iter()
            .filter(|e| e.condition == Some(condition) && !self.used.contains(&e.index))
            .collect()
    }

    /// Draw one unused word of `condition` uniformly at random and mark it used.
    pub fn pick<R: Rng + ?Sized>(&mut self, condition: i64, rng: &mut R) -> Option<&'a WordEntry> {
        let entry = *self.available(condition).choose(rng)?;
        self.used.insert(entry.index);
        Some(entry)
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.used.contains(&index)
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }
}

/// Word list errors.
#[derive(Debug)]
pub enum WordListError {
    IoError(String),
    ParseError(String),
    MissingColumn(&'static str),
}

impl std::fmt::Display for WordListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WordListError::IoError(e) => write!(f, "IO error: {e}"),
            WordListError::ParseError(e) => write!(f, "Parse error: {e}"),
            WordListError::MissingColumn(c) => write!(f, "Word list has no '{c}' column"),
        }
    }
}

impl std::error::Error for WordListError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SAMPLE: &str = " word ; condition \n\
                          apple;1\n\
                          horse;2\n\
                          banana;1\n\
                          table;x\n\
                          tiger;2.0\n";

    #[test]
    fn test_parse_trims_headers_and_coerces_conditions() {
        let list = WordList::from_reader(SAMPLE.as_bytes(), b';').unwrap();
        assert_eq!(list.len(), 5);
        assert_eq!(list.entries()[0].word, "apple");
        assert_eq!(list.entries()[3].condition, None);
        assert_eq!(list.entries()[4].condition, Some(2));
        assert_eq!(list.entries()[4].index, 4);
    }

    #[test]
    fn test_word_text_is_kept_verbatim() {
        let data = "word;condition\n ice cream ; 2 \n   ;1\n";
        let list = WordList::from_reader(data.as_bytes(), b';').unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.entries()[0].word, " ice cream ");
        assert_eq!(list.entries()[0].condition, Some(2));
    }

    #[test]
    fn test_count_by_condition() {
        let list = WordList::from_reader(SAMPLE.as_bytes(), b';').unwrap();
        let counts = list.count_by_condition();
        assert_eq!(counts[&Some(1)], 2);
        assert_eq!(counts[&Some(2)], 2);
        assert_eq!(counts[&None], 1);
    }

    #[test]
    fn test_missing_column() {
        let err = WordList::from_reader("word;category\napple;1\n".as_bytes(), b';').unwrap_err();
        assert!(matches!(err, WordListError::MissingColumn("condition")));
    }

    #[test]
    fn test_tab_delimited_with_extra_columns() {
        let data = "id\tword\tcondition\n7\tmouse\t2\n";
        let list = WordList::from_reader(data.as_bytes(), b'\t').unwrap();
        assert_eq!(list.entries()[0].word, "mouse");
        assert_eq!(list.entries()[0].condition, Some(2));
    }

    #[test]
    fn test_empty_words_are_skipped_but_keep_row_indices() {
        let data = "word;condition\n;1\npear;1\n";
        let list = WordList::from_reader(data.as_bytes(), b';').unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.entries()[0].index, 1);
    }

    #[test]
    fn test_pick_respects_condition_and_never_repeats() {
        let list = WordList::from_pairs([
            ("apple", 1),
            ("horse", 2),
            ("banana", 1),
            ("tiger", 2),
            ("cherry", 1),
        ]);
        let mut selector = WordSelector::new(&list);
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let entry = selector.pick(1, &mut rng).unwrap();
            assert_eq!(entry.condition, Some(1));
            assert!(seen.insert(entry.index));
        }
        assert!(selector.pick(1, &mut rng).is_none());
        assert_eq!(selector.available(2).len(), 2);
        assert_eq!(selector.used_count(), 3);
    }

    #[test]
    fn test_pick_unknown_condition() {
        let list = WordList::from_pairs([("apple", 1)]);
        let mut selector = WordSelector::new(&list);
        assert!(selector.pick(9, &mut StdRng::seed_from_u64(1)).is_none());
        assert!(!selector.is_used(0));
    }
}
