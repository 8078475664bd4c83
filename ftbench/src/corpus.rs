use std::{
    collections::HashSet,
    fs, io,
    ops::Index,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read the dataset at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Line {line} is not a valid record: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A single line of the news dataset. Fields other than these three are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub link: String,
    pub headline: String,
    pub short_description: String,
}

impl Record {
    /// Parses one dataset line. A key that appears more than once keeps its last value.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(line)?;

        serde_json::from_value(serde_json::Value::Object(object))
    }

    #[must_use]
    pub fn text(&self) -> String {
        format!("{} {}", self.headline, self.short_description)
    }
}

/// Maximal runs of ASCII letters, left to right.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
}

/// The distinct words of a dataset, shared read-only by every virtual user.
///
/// Words keep the order of their first occurrence, so seeded runs sample the same queries, but
/// nothing should depend on that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    words: Box<[String]>,
}

impl Corpus {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();

        info!("reading dataset from {path:?}");

        let contents = fs::read_to_string(path).map_err(|source| CorpusError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_ndjson(&contents)
    }

    /// Builds the corpus from newline-delimited JSON records.
    ///
    /// Only lines that are exactly empty are skipped, a line holding just whitespace is a parse
    /// error. The first invalid line fails the whole build.
    pub fn from_ndjson(contents: &str) -> Result<Self, CorpusError> {
        let records = contents
            .split('\n')
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(index, line)| {
                Record::parse(line).map_err(|source| CorpusError::Parse {
                    line: index + 1,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let texts = records.iter().map(Record::text).collect::<Vec<_>>();
        let corpus = Self::from_texts(texts.iter().map(String::as_str));

        info!(
            records = records.len(),
            words = corpus.len(),
            "corpus built"
        );

        Ok(corpus)
    }

    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let tokens = texts.into_iter().flat_map(words).collect::<Vec<_>>();

        debug!("extracted {} tokens before deduplication", tokens.len());

        let mut seen = HashSet::with_capacity(tokens.len());
        let words = tokens
            .into_iter()
            .filter(|token| seen.insert(*token))
            .map(str::to_owned)
            .collect();

        Self { words }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.iter().any(|candidate| candidate == word)
    }
}

impl Index<usize> for Corpus {
    type Output = str;

    fn index(&self, index: usize) -> &Self::Output {
        &self.words[index]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;
    use tempfile::NamedTempFile;

    use super::*;

    fn line(headline: &str, short_description: &str) -> String {
        serde_json::json!({
            "link": "https://example.com/news",
            "headline": headline,
            "short_description": short_description,
        })
        .to_string()
    }

    fn letter_runs(text: &str) -> Vec<String> {
        let mut runs = vec![];
        let mut current = String::new();

        for c in text.chars() {
            if c.is_ascii_alphabetic() {
                current.push(c);
            } else if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        }

        if !current.is_empty() {
            runs.push(current);
        }

        runs
    }

    fn sorted(corpus: &Corpus) -> Vec<&str> {
        let mut words = corpus.iter().collect::<Vec<_>>();
        words.sort_unstable();
        words
    }

    #[test_log::test]
    fn extracts_words_from_headline_and_description() {
        let corpus = Corpus::from_ndjson(
            r#"{"link":"x","headline":"Cats Fly","short_description":"A story."}"#,
        )
        .unwrap();

        assert_eq!(vec!["Cats", "Fly", "A", "story"], corpus.iter().collect::<Vec<_>>());
    }

    #[test]
    fn headline_and_description_do_not_merge() {
        let corpus = Corpus::from_ndjson(&line("ends", "starts")).unwrap();

        assert!(corpus.contains("ends"));
        assert!(corpus.contains("starts"));
        assert!(!corpus.contains("endsstarts"));
    }

    #[test]
    fn splits_on_digits_punctuation_and_non_ascii() {
        let corpus = Corpus::from_ndjson(&line("COVID19 isn't 3D", "café naïve--über")).unwrap();

        assert_eq!(
            vec!["COVID", "isn", "t", "D", "caf", "na", "ve", "ber"],
            corpus.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn keeps_case_and_drops_duplicates() {
        let contents = [line("The the THE", "the"), line("the", "The")].join("\n");

        let corpus = Corpus::from_ndjson(&contents).unwrap();

        assert_eq!(vec!["The", "the", "THE"], corpus.iter().collect::<Vec<_>>());
    }

    #[test]
    fn ignores_extra_fields() {
        let corpus = Corpus::from_ndjson(
            r#"{"link":"x","headline":"Hi","short_description":"there","category":"U.S. NEWS","date":"2022-09-23"}"#,
        )
        .unwrap();

        assert_eq!(vec!["Hi", "there"], corpus.iter().collect::<Vec<_>>());
    }

    #[test]
    fn skips_empty_lines() {
        let contents = format!("\n{}\n\n{}\n", line("one", ""), line("", "two"));

        let corpus = Corpus::from_ndjson(&contents).unwrap();

        assert_eq!(vec!["one", "two"], corpus.iter().collect::<Vec<_>>());
    }

    #[test]
    fn whitespace_only_line_is_an_error() {
        let contents = format!("{}\n   \n", line("one", "two"));

        let result = Corpus::from_ndjson(&contents);

        assert!(matches!(result, Err(CorpusError::Parse { line: 2, .. })));
    }

    #[test]
    fn malformed_line_fails_the_whole_build() {
        let contents = format!("{}\n{{\"headline\": \n{}", line("a", "b"), line("c", "d"));

        let result = Corpus::from_ndjson(&contents);

        assert!(matches!(result, Err(CorpusError::Parse { line: 2, .. })));
    }

    #[test]
    fn repeated_key_keeps_its_last_value() {
        let corpus = Corpus::from_ndjson(
            r#"{"link":"x","headline":"Old","short_description":"story","headline":"New"}"#,
        )
        .unwrap();

        assert_eq!(vec!["New", "story"], corpus.iter().collect::<Vec<_>>());
    }

    #[test]
    fn line_that_is_not_an_object_is_an_error() {
        let result = Corpus::from_ndjson(r#"["x","Cats","Fly"]"#);

        assert!(matches!(result, Err(CorpusError::Parse { line: 1, .. })));
    }

    #[test]
    fn missing_field_is_an_error() {
        let result = Corpus::from_ndjson(r#"{"link":"x","headline":"Cats Fly"}"#);

        assert!(matches!(result, Err(CorpusError::Parse { line: 1, .. })));
    }

    #[test]
    fn non_string_field_is_an_error() {
        let result =
            Corpus::from_ndjson(r#"{"link":"x","headline":12,"short_description":"A story."}"#);

        assert!(matches!(result, Err(CorpusError::Parse { line: 1, .. })));
    }

    #[test]
    fn empty_input_gives_empty_corpus() {
        let corpus = Corpus::from_ndjson("").unwrap();

        assert!(corpus.is_empty());
        assert_eq!(0, corpus.len());
        assert_eq!(None, corpus.get(0));
    }

    #[test]
    fn reads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", line("Cats Fly", "A story.")).unwrap();
        writeln!(file, "{}", line("Dogs Run", "Another story.")).unwrap();

        let corpus = Corpus::from_path(file.path()).unwrap();

        assert_eq!(
            vec!["A", "Another", "Cats", "Dogs", "Fly", "Run", "story"],
            sorted(&corpus)
        );
        assert_eq!("Cats", &corpus[0]);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let directory = tempfile::tempdir().unwrap();

        let result = Corpus::from_path(directory.path().join("missing.json"));

        assert!(matches!(result, Err(CorpusError::Read { .. })));
    }

    #[quickcheck]
    fn every_letter_run_is_in_the_corpus(records: Vec<(String, String)>) -> bool {
        let contents = records
            .iter()
            .map(|(headline, description)| line(headline, description))
            .collect::<Vec<_>>()
            .join("\n");

        let corpus = Corpus::from_ndjson(&contents).unwrap();

        records.iter().all(|(headline, description)| {
            letter_runs(&format!("{headline} {description}"))
                .iter()
                .all(|run| corpus.contains(run))
        })
    }

    #[quickcheck]
    fn corpus_words_are_distinct_letter_runs(texts: Vec<String>) -> bool {
        let corpus = Corpus::from_texts(texts.iter().map(String::as_str));

        let distinct = corpus.iter().collect::<HashSet<_>>();

        distinct.len() == corpus.len()
            && corpus
                .iter()
                .all(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic()))
    }

    #[quickcheck]
    fn building_twice_gives_the_same_words(records: Vec<(String, String)>) -> bool {
        let contents = records
            .iter()
            .map(|(headline, description)| line(headline, description))
            .collect::<Vec<_>>()
            .join("\n");

        let first = Corpus::from_ndjson(&contents).unwrap();
        let second = Corpus::from_ndjson(&contents).unwrap();

        sorted(&first) == sorted(&second)
    }
}
