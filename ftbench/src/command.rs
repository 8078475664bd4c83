use redis::Cmd;

use crate::sampler::Query;

pub const SEARCH_COMMAND: &str = "FT.SEARCH";
pub const INDEX_NAME: &str = "idx";
pub const RESULT_OFFSET: u32 = 0;
pub const RESULT_LIMIT: u32 = 20;

/// `FT.SEARCH idx <query> LIMIT 0 20`, the only command the load test sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCommand {
    query: Query,
}

impl SearchCommand {
    #[must_use]
    pub const fn new(query: Query) -> Self {
        Self { query }
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    #[must_use]
    pub fn args(&self) -> [String; 6] {
        [
            SEARCH_COMMAND.to_string(),
            INDEX_NAME.to_string(),
            self.query.to_string(),
            "LIMIT".to_string(),
            RESULT_OFFSET.to_string(),
            RESULT_LIMIT.to_string(),
        ]
    }

    #[must_use]
    pub fn to_cmd(&self) -> Cmd {
        let [name, rest @ ..] = self.args();

        let mut cmd = redis::cmd(&name);
        for arg in rest {
            cmd.arg(arg);
        }

        cmd
    }
}
