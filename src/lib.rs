//! Point-in-time snapshots of a SQL Server database for test suites.
//!
//! ```no_run
//! use dbsnapshot::{ConnectionDescriptor, SnapshotManager};
//!
//! # fn main() -> dbsnapshot::Result<()> {
//! let conn = ConnectionDescriptor::new(
//!     "Server=tcp:localhost,1433;User Id=sa;Password=pw;Pooling=false",
//! );
//! let mut snapshot = SnapshotManager::safe(conn, "Inventory")?;
//! snapshot.save()?;
//! // ... destructive test ...
//! snapshot.restore()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod drivers;
pub mod errors;
pub mod manager;
pub mod storage;
pub mod utils;

pub use config::ConnectionDescriptor;
pub use drivers::{CommandExecutor, MsSqlExecutor};
pub use errors::{ExecutionError, Result, SnapshotError};
pub use manager::{ManagerState, ReleasePolicy, SnapshotManager, SnapshotManagerBuilder};
pub use storage::SnapshotInfo;
