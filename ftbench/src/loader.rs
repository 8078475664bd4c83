use std::{
    collections::BTreeMap,
    future::Future,
    io,
    path::{Path, PathBuf},
};

use redis::Cmd;
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::info;

use crate::client::{ClientError, RedisConnection};

const PROGRESS_EVERY: usize = 10_000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read the dataset at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Line {line} is not a flat object of strings: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Line {line} has no link to use as the key")]
    MissingLink { line: usize },
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub trait Store {
    /// Runs a write command, the reply is ignored.
    fn execute(&mut self, cmd: &Cmd) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl Store for RedisConnection {
    async fn execute(&mut self, cmd: &Cmd) -> Result<(), ClientError> {
        self.query(cmd).await.map(|_| ())
    }
}

/// One dataset line, stored as a hash keyed by its link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    link: String,
    fields: BTreeMap<String, String>,
}

impl Document {
    pub fn parse(line_number: usize, line: &str) -> Result<Self, LoadError> {
        let fields: BTreeMap<String, String> =
            serde_json::from_str(line).map_err(|source| LoadError::Parse {
                line: line_number,
                source,
            })?;

        let link = fields
            .get("link")
            .filter(|link| !link.is_empty())
            .cloned()
            .ok_or(LoadError::MissingLink { line: line_number })?;

        Ok(Self { link, fields })
    }

    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    /// `HSET <link> <field> <value> ...`, fields in lexicographic order.
    #[must_use]
    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd("HSET");
        cmd.arg(&self.link);

        for (field, value) in &self.fields {
            cmd.arg(field).arg(value);
        }

        cmd
    }
}

/// Empties the current database, then stores every document of the dataset.
///
/// Stops at the first line that fails to parse or to store, documents stored before it are kept.
pub async fn load<TStore: Store>(
    path: impl AsRef<Path>,
    store: &mut TStore,
) -> Result<usize, LoadError> {
    let path = path.as_ref();
    let read_error = |source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).await.map_err(read_error)?;

    info!("flushing the database before loading {path:?}");
    store.execute(&redis::cmd("FLUSHDB")).await?;

    let mut lines = BufReader::new(file).lines();
    let mut line_number = 0;
    let mut loaded = 0;

    while let Some(line) = lines.next_line().await.map_err(read_error)? {
        line_number += 1;

        if line.is_empty() {
            continue;
        }

        let document = Document::parse(line_number, &line)?;
        store.execute(&document.to_cmd()).await?;

        loaded += 1;
        if loaded % PROGRESS_EVERY == 0 {
            info!("loaded {loaded} documents so far");
        }
    }

    info!("loaded {loaded} documents");

    Ok(loaded)
}
