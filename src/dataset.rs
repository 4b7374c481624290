use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamError};

const LABEL_COLUMNS: &[&str] = &["v1", "label"];
const TEXT_COLUMNS: &[&str] = &["v2", "text", "message"];

/// Binary message category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    #[default]
    Ham,
    Spam,
}

impl linfa::Label for Label {}

impl Label {
    pub const ALL: [Label; 2] = [Label::Ham, Label::Spam];

    /// Maps a raw dataset value to a label, `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Label> {
        match raw.trim().to_lowercase().as_str() {
            "ham" => Some(Label::Ham),
            "spam" => Some(Label::Spam),
            _ => None,
        }
    }

    /// `0` for ham, `1` for spam.
    pub fn as_index(self) -> usize {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }

    pub fn from_decision(score: f64) -> Label {
        if score > 0.0 { Label::Spam } else { Label::Ham }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Ham => "HAM",
            Label::Spam => "SPAM",
        }
    }

    /// Title-case name used in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Label::Ham => "Ham",
            Label::Spam => "Spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single labelled message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub label: Label,
}

impl Message {
    pub fn new(label: Label, text: impl Into<String>) -> Self {
        Message {
            text: text.into(),
            label,
        }
    }
}

/// Messages read from disk plus the number of rows discarded on the way.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub messages: Vec<Message>,
    pub dropped: usize,
}

impl LoadedDataset {
    pub fn count(&self, label: Label) -> usize {
        self.messages.iter().filter(|m| m.label == label).count()
    }
}

/// A helper type for holding train/test splits.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<Message>,
    pub test: Vec<Message>,
}

/// Loads a labelled CSV dataset.
///
/// The header must name a label column (`v1` or `label`) and a text column
/// (`v2`, `text` or `message`); any other columns are ignored. Fields that
/// are not valid UTF-8 are read as Latin-1. Rows with an unknown label or
/// empty text are dropped and counted.
pub fn load_dataset(path: &Path) -> Result<LoadedDataset> {
    if !path.exists() {
        return Err(SpamError::DatasetNotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| decode_field(h).trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();

    let label_idx = find_column(&headers, LABEL_COLUMNS).ok_or_else(|| {
        SpamError::DatasetFormatError(format!(
            "no label column (expected one of {LABEL_COLUMNS:?}), found {headers:?}"
        ))
    })?;
    let text_idx = find_column(&headers, TEXT_COLUMNS).ok_or_else(|| {
        SpamError::DatasetFormatError(format!(
            "no text column (expected one of {TEXT_COLUMNS:?}), found {headers:?}"
        ))
    })?;

    let mut messages = Vec::new();
    let mut dropped = 0;

    for result in rdr.byte_records() {
        let record = result?;
        let label = record.get(label_idx).map(decode_field);
        let text = record.get(text_idx).map(decode_field);

        match (label.as_deref().and_then(Label::parse), text) {
            (Some(label), Some(text)) if !text.trim().is_empty() => {
                messages.push(Message { text, label });
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("Dropped {dropped} rows with an unknown label or empty text from {path:?}");
    }

    let dataset = LoadedDataset { messages, dropped };
    debug!(
        "Loaded {} messages ({} ham, {} spam)",
        dataset.messages.len(),
        dataset.count(Label::Ham),
        dataset.count(Label::Spam)
    );

    for label in Label::ALL {
        if dataset.count(label) == 0 {
            return Err(SpamError::DatasetFormatError(format!(
                "dataset contains no {} messages",
                label.display_name().to_lowercase()
            )));
        }
    }

    Ok(dataset)
}

fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|h| candidates.contains(&h.as_str()))
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1 maps each byte to the code point of the same value.
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Splits messages into train and test sets, preserving the class ratio.
///
/// Each class is shuffled with a generator seeded by `seed` and contributes
/// `round(n * test_ratio)` messages to the test side, always leaving at
/// least one for training.
pub fn stratified_split(data: &[Message], test_ratio: f64, seed: u64) -> DatasetSplit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for label in Label::ALL {
        let mut class: Vec<Message> = data.iter().filter(|m| m.label == label).cloned().collect();
        class.shuffle(&mut rng);

        let test_size = ((class.len() as f64) * test_ratio).round() as usize;
        let test_size = test_size.min(class.len().saturating_sub(1));

        train.extend_from_slice(&class[test_size..]);
        test.extend_from_slice(&class[..test_size]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    DatasetSplit { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    fn messages(ham: usize, spam: usize) -> Vec<Message> {
        (0..ham)
            .map(|i| Message::new(Label::Ham, format!("ham {i}")))
            .chain((0..spam).map(|i| Message::new(Label::Spam, format!("spam {i}"))))
            .collect()
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!(Label::parse("ham"), Some(Label::Ham));
        assert_eq!(Label::parse(" SPAM "), Some(Label::Spam));
        assert_eq!(Label::parse("eggs"), None);
        assert_eq!(Label::parse(""), None);
    }

    #[test]
    fn loads_sms_collection_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "spam.csv",
            b"v1,v2,,,\nham,Go until jurong point,,,\nspam,Free entry in 2 a wkly comp,,,\n",
        );

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.messages.len(), 2);
        assert_eq!(dataset.dropped, 0);
        assert_eq!(dataset.messages[0], Message::new(Label::Ham, "Go until jurong point"));
        assert_eq!(dataset.messages[1].label, Label::Spam);
    }

    #[test]
    fn drops_unknown_labels_and_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "spam.csv",
            b"label,text\nham,hello there\nmaybe,what is this\nspam,   \nspam,win cash now\n",
        );

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.messages.len(), 2);
        assert_eq!(dataset.dropped, 2);
    }

    #[test]
    fn decodes_latin1_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "spam.csv",
            b"v1,v2\nham,caf\xe9 at noon\nspam,win \xa3100 now\n",
        );

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.messages[0].text, "café at noon");
        assert_eq!(dataset.messages[1].text, "win £100 now");
    }

    #[test]
    fn missing_file_is_dataset_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, SpamError::DatasetNotFound(_)));
    }

    #[test]
    fn missing_columns_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "spam.csv", b"kind,body\nham,hello\n");
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, SpamError::DatasetFormatError(_)));
    }

    #[test]
    fn single_class_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "spam.csv", b"v1,v2\nham,hello\nham,hi again\n");
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, SpamError::DatasetFormatError(_)));
    }

    #[test]
    fn split_preserves_class_ratio() {
        let data = messages(80, 20);
        let split = stratified_split(&data, 0.2, 42);

        let count = |v: &[Message], l| v.iter().filter(|m| m.label == l).count();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        assert_eq!(count(&split.test, Label::Ham), 16);
        assert_eq!(count(&split.test, Label::Spam), 4);
        assert_eq!(count(&split.train, Label::Spam), 16);
    }

    #[test]
    fn split_is_reproducible_for_a_seed() {
        let data = messages(30, 10);
        let a = stratified_split(&data, 0.25, 7);
        let b = stratified_split(&data, 0.25, 7);
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn split_keeps_a_training_sample_per_class() {
        let data = messages(1, 1);
        let split = stratified_split(&data, 0.9, 42);
        assert_eq!(split.train.len(), 2);
        assert!(split.test.is_empty());
    }
}
