use std::{env, fmt::Debug};

pub const PRIMARY_ADDRS_VAR: &str = "REDIS_ADDRS";
pub const PRIMARY_PASSWORD_VAR: &str = "REDIS_PASSWORD";
pub const SEARCH_ADDRS_VAR: &str = "REDISEARCH_ADDRS";
pub const SEARCH_PASSWORD_VAR: &str = "REDISEARCH_PASSWORD";

pub const DEFAULT_PRIMARY_ADDR: &str = "localhost:6379";
pub const DEFAULT_SEARCH_ADDR: &str = "localhost:16379";

/// Endpoints and credentials of one client, as read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub addrs: Vec<String>,
    pub password: String,
}

impl Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("addrs", &self.addrs)
            .field(
                "password",
                &if self.password.is_empty() { "" } else { "<redacted>" },
            )
            .finish()
    }
}

impl ClientConfig {
    /// A comma-separated list of `host:port` endpoints. Entries are trimmed, empty ones dropped,
    /// and when nothing is left (or the variable is unset) `default_addr` is used.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        addrs_var: &str,
        password_var: &str,
        default_addr: &str,
    ) -> Self {
        let mut addrs = lookup(addrs_var)
            .map(|value| parse_addrs(&value))
            .unwrap_or_default();

        if addrs.is_empty() {
            addrs.push(default_addr.to_string());
        }

        Self {
            addrs,
            password: lookup(password_var).unwrap_or_default(),
        }
    }
}

fn parse_addrs(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The data store the documents are loaded into.
    pub primary: ClientConfig,
    /// The full-text search service the queries are sent to.
    pub search: ClientConfig,
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            primary: ClientConfig::from_lookup(
                &lookup,
                PRIMARY_ADDRS_VAR,
                PRIMARY_PASSWORD_VAR,
                DEFAULT_PRIMARY_ADDR,
            ),
            search: ClientConfig::from_lookup(
                &lookup,
                SEARCH_ADDRS_VAR,
                SEARCH_PASSWORD_VAR,
                DEFAULT_SEARCH_ADDR,
            ),
        }
    }
}
