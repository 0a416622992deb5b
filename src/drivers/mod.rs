use crate::errors::ExecutionError;

pub mod mssql;

pub use mssql::MsSqlExecutor;

/// Catalog every administrative command runs from. The engine refuses to back up
/// or restore a database that is the connection's active context.
pub const ADMIN_CATALOG: &str = "master";

/// Runs one administrative command per call, from the [`ADMIN_CATALOG`] context.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    fn name(&self) -> &'static str;

    /// Open a connection, switch to the administrative catalog, run `command` as a
    /// single non-query round trip and close the connection on every exit path.
    fn execute(&self, command: &str) -> Result<(), ExecutionError>;
}
