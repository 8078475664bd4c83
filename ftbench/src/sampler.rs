use std::{fmt::Display, sync::Arc};

use rand::Rng;
use thiserror::Error;

use crate::corpus::Corpus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("The corpus is empty, there is nothing to sample queries from")]
    EmptyCorpus,
}

/// Two corpus words joined by a single space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    #[must_use]
    pub fn new(first: &str, second: &str) -> Self {
        Self(format!("{first} {second}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ')
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Samples queries from a corpus that is known to be non-empty.
///
/// Cloning is cheap, every clone shares the same corpus.
#[derive(Debug, Clone)]
pub struct QuerySampler {
    corpus: Arc<Corpus>,
}

impl QuerySampler {
    pub fn new(corpus: Arc<Corpus>) -> Result<Self, SampleError> {
        if corpus.is_empty() {
            return Err(SampleError::EmptyCorpus);
        }

        Ok(Self { corpus })
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Both words are drawn independently, so they can be the same word.
    pub fn sample<TRng: Rng>(&self, rng: &mut TRng) -> Query {
        let first = rng.random_range(0..self.corpus.len());
        let second = rng.random_range(0..self.corpus.len());

        Query::new(&self.corpus[first], &self.corpus[second])
    }
}
