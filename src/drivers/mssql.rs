use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use super::{ADMIN_CATALOG, CommandExecutor};
use crate::config::ConnectionDescriptor;
use crate::errors::{ExecutionError, Result, SnapshotError};
use crate::utils::sql::quote_identifier;

type MsSqlClient = Client<Compat<TcpStream>>;

/// SQL Server executor over TDS. Blocking: each call drives a private
/// current-thread runtime to completion.
pub struct MsSqlExecutor {
    config: Config,
    runtime: Runtime,
}

impl MsSqlExecutor {
    pub fn new(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let config = Config::from_ado_string(descriptor.as_str()).map_err(|e| {
            SnapshotError::Configuration(format!("invalid connection string: {}", e))
        })?;
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { config, runtime })
    }

    async fn connect(&self) -> std::result::Result<MsSqlClient, ExecutionError> {
        let addr = self.config.get_addr();
        debug!(%addr, "opening administrative connection");
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| ExecutionError::Connect(Box::new(e)))?;
        tcp.set_nodelay(true)
            .map_err(|e| ExecutionError::Connect(Box::new(e)))?;
        Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| ExecutionError::Connect(Box::new(e)))
    }

    async fn run(&self, command: &str) -> std::result::Result<(), ExecutionError> {
        // Dropped on every early return, which closes the socket.
        let mut client = self.connect().await?;

        client
            .simple_query(format!("USE {}", quote_identifier(ADMIN_CATALOG)))
            .await
            .map_err(command_error)?
            .into_results()
            .await
            .map_err(command_error)?;

        debug!(command, "executing administrative command");
        client
            .simple_query(command)
            .await
            .map_err(command_error)?
            .into_results()
            .await
            .map_err(command_error)?;

        client.close().await.map_err(command_error)
    }
}

fn command_error(e: tiberius::error::Error) -> ExecutionError {
    ExecutionError::Command(Box::new(e))
}

impl CommandExecutor for MsSqlExecutor {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn execute(&self, command: &str) -> std::result::Result<(), ExecutionError> {
        self.runtime.block_on(self.run(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_ado_string() {
        let d = ConnectionDescriptor::new(concat!(
            "Server=tcp:127.0.0.1,1433;User Id=sa;Password=pw;",
            "TrustServerCertificate=true;Pooling=false",
        ));
        let executor = MsSqlExecutor::new(&d).unwrap();
        assert_eq!(executor.name(), "mssql");
    }

    #[test]
    fn connection_refused_is_a_connect_error() {
        // Port 1 on loopback is not a SQL Server.
        let d = ConnectionDescriptor::new("Server=tcp:127.0.0.1,1;User Id=sa;Password=pw");
        let executor = MsSqlExecutor::new(&d).unwrap();
        let err = executor.execute("SELECT 1").unwrap_err();
        assert!(matches!(err, ExecutionError::Connect(_)));
    }
}
