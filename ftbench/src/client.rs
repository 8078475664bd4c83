use std::future::Future;

use redis::{
    Cmd, ConnectionInfo, IntoConnectionInfo, RedisError, Value, aio::MultiplexedConnection,
    cluster::ClusterClientBuilder, cluster_async::ClusterConnection,
};
use thiserror::Error;
use tracing::info;

use crate::{command::SearchCommand, config::ClientConfig};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No endpoints were configured")]
    NoEndpoints,
    #[error("Invalid endpoint {addr:?}: {source}")]
    InvalidEndpoint {
        addr: String,
        #[source]
        source: RedisError,
    },
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),
}

/// Something `FT.SEARCH` can be sent to. Every virtual user owns its own clone.
pub trait SearchTarget: Clone + Send + 'static {
    /// Sends the command and waits for the reply, which is discarded.
    fn search(
        &mut self,
        command: &SearchCommand,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

#[derive(Clone)]
pub enum RedisConnection {
    Single(MultiplexedConnection),
    Cluster(ClusterConnection),
}

impl RedisConnection {
    /// A single endpoint gets a plain multiplexed connection, several endpoints are treated as
    /// the seed nodes of a cluster.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        match config.addrs.as_slice() {
            [] => Err(ClientError::NoEndpoints),
            [addr] => {
                let info = connection_info(addr, &config.password)?;
                let client = redis::Client::open(info)?;

                info!("connecting to {addr}");

                Ok(Self::Single(
                    client.get_multiplexed_async_connection().await?,
                ))
            }
            addrs => {
                let nodes = addrs
                    .iter()
                    .map(|addr| connection_info(addr, ""))
                    .collect::<Result<Vec<_>, _>>()?;

                let mut builder = ClusterClientBuilder::new(nodes);
                if !config.password.is_empty() {
                    builder = builder.password(config.password.clone());
                }

                info!("connecting to a cluster through {addrs:?}");

                Ok(Self::Cluster(builder.build()?.get_async_connection().await?))
            }
        }
    }

    pub async fn query(&mut self, cmd: &Cmd) -> Result<Value, ClientError> {
        let value = match self {
            Self::Single(connection) => cmd.query_async(connection).await?,
            Self::Cluster(connection) => cmd.query_async(connection).await?,
        };

        Ok(value)
    }
}

impl SearchTarget for RedisConnection {
    async fn search(&mut self, command: &SearchCommand) -> Result<(), ClientError> {
        self.query(&command.to_cmd()).await.map(|_| ())
    }
}

fn connection_info(addr: &str, password: &str) -> Result<ConnectionInfo, ClientError> {
    let mut info = format!("redis://{addr}")
        .into_connection_info()
        .map_err(|source| ClientError::InvalidEndpoint {
            addr: addr.to_string(),
            source,
        })?;

    if !password.is_empty() {
        info.redis.password = Some(password.to_string());
    }

    Ok(info)
}
