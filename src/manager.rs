//! Snapshot lifecycle: save, restore, delete and the scope-exit release policy.
//!
//! A manager is bound to one database and owns exactly one backup artifact.
//! Its state is never stored; it is read back from the filesystem on every call.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ConnectionDescriptor;
use crate::drivers::{CommandExecutor, MsSqlExecutor};
use crate::errors::{Result, SnapshotError};
use crate::storage::{SnapshotInfo, WorkLayout};
use crate::utils::sql::{backup_command, restore_command};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    NoSnapshot,
    SnapshotPresent,
}

/// What happens to the snapshot when the manager goes out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePolicy {
    /// Delete the artifact, ignoring filesystem errors. Does NOT restore: a
    /// snapshot that was never restored is discarded and the database keeps
    /// whatever changes were made after the save.
    Basic,
    /// Restore the database from the artifact if one exists, then delete it.
    /// Requires a connection with pooling disabled.
    Safe,
}

pub struct SnapshotManagerBuilder {
    descriptor: ConnectionDescriptor,
    database: String,
    policy: ReleasePolicy,
    work_root: Option<PathBuf>,
}

impl SnapshotManagerBuilder {
    pub fn new(descriptor: ConnectionDescriptor, database: impl Into<String>) -> Self {
        Self {
            descriptor,
            database: database.into(),
            policy: ReleasePolicy::Safe,
            work_root: None,
        }
    }

    pub fn policy(mut self, policy: ReleasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Directory under which the work directory is created. Defaults to the
    /// process's current directory at build time.
    pub fn work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn build(self) -> Result<SnapshotManager<MsSqlExecutor>> {
        self.check_policy()?;
        let executor = MsSqlExecutor::new(&self.descriptor)?;
        self.build_with(executor)
    }

    pub fn build_with<E: CommandExecutor>(self, executor: E) -> Result<SnapshotManager<E>> {
        self.check_policy()?;
        validate_database_name(&self.database)?;
        let root = match self.work_root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        let layout = WorkLayout::new(&root, &self.database)?;
        debug!(
            database = %self.database,
            policy = ?self.policy,
            executor = executor.name(),
            work_dir = %layout.work_dir().display(),
            "snapshot manager ready"
        );
        Ok(SnapshotManager {
            descriptor: self.descriptor,
            database: self.database,
            layout,
            policy: self.policy,
            executor,
            released: false,
        })
    }

    fn check_policy(&self) -> Result<()> {
        match self.policy {
            ReleasePolicy::Safe => self.descriptor.require_pooling_disabled(),
            ReleasePolicy::Basic => Ok(()),
        }
    }
}

/// The name becomes the artifact's file name, so it must stay inside the work directory.
fn validate_database_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SnapshotError::Configuration(
            "database name must not be empty".to_string(),
        ));
    }
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(SnapshotError::Configuration(format!(
            "database name '{}' cannot be used as a backup file name",
            name
        )));
    }
    Ok(())
}

/// Point-in-time snapshot of one database, released deterministically on drop.
///
/// Not synchronized: callers serialize access themselves.
pub struct SnapshotManager<E: CommandExecutor = MsSqlExecutor> {
    descriptor: ConnectionDescriptor,
    database: String,
    layout: WorkLayout,
    policy: ReleasePolicy,
    executor: E,
    released: bool,
}

impl SnapshotManager<MsSqlExecutor> {
    /// Manager whose release only deletes the artifact.
    pub fn basic(descriptor: ConnectionDescriptor, database: impl Into<String>) -> Result<Self> {
        SnapshotManagerBuilder::new(descriptor, database)
            .policy(ReleasePolicy::Basic)
            .build()
    }

    /// Manager whose release restores the database before deleting the artifact.
    /// Fails with [`SnapshotError::Configuration`] unless pooling is disabled.
    pub fn safe(descriptor: ConnectionDescriptor, database: impl Into<String>) -> Result<Self> {
        SnapshotManagerBuilder::new(descriptor, database)
            .policy(ReleasePolicy::Safe)
            .build()
    }
}

impl<E: CommandExecutor> SnapshotManager<E> {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    pub fn work_dir(&self) -> &Path {
        self.layout.work_dir()
    }

    pub fn backup_file_path(&self) -> &Path {
        self.layout.artifact_path()
    }

    pub fn state(&self) -> ManagerState {
        if self.layout.artifact_exists() {
            ManagerState::SnapshotPresent
        } else {
            ManagerState::NoSnapshot
        }
    }

    pub fn exists(&self) -> bool {
        self.state() == ManagerState::SnapshotPresent
    }

    pub fn info(&self) -> Result<Option<SnapshotInfo>> {
        Ok(self.layout.artifact_info(&self.database)?)
    }

    /// Save a snapshot, replacing any existing one.
    pub fn save(&mut self) -> Result<()> {
        self.save_with(true)
    }

    pub fn save_with(&mut self, overwrite_existing: bool) -> Result<()> {
        if self.exists() {
            if !overwrite_existing {
                return Err(SnapshotError::ExistingSnapshot {
                    path: self.backup_file_path().to_path_buf(),
                });
            }
            self.delete()?;
        }

        self.layout.ensure_work_dir()?;
        let path = self.layout.artifact_text();
        let command = backup_command(&self.database, path);
        if let Err(err) = self.executor.execute(&command) {
            self.layout.discard_empty_work_dir();
            return Err(err.into());
        }

        info!(database = %self.database, path = %path, "snapshot saved");
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        if !self.exists() {
            return Err(SnapshotError::NoSnapshot {
                path: self.backup_file_path().to_path_buf(),
            });
        }

        let path = self.layout.artifact_text();
        let command = restore_command(&self.database, path);
        self.executor.execute(&command)?;

        info!(database = %self.database, path = %path, "snapshot restored");
        Ok(())
    }

    /// Remove the artifact and the work directory. Idempotent.
    pub fn delete(&mut self) -> Result<()> {
        if self.layout.remove_artifact()? {
            info!(database = %self.database, "snapshot deleted");
        }
        Ok(())
    }

    /// Run the release policy now and surface its errors. Dropping the manager
    /// runs the same policy but can only log failures.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.run_release()
    }

    /// Disarm the release policy and keep the artifact on disk.
    pub fn persist(mut self) -> PathBuf {
        self.released = true;
        self.backup_file_path().to_path_buf()
    }

    fn run_release(&mut self) -> Result<()> {
        match self.policy {
            ReleasePolicy::Basic => {
                if let Err(err) = self.delete() {
                    warn!(
                        database = %self.database,
                        error = %err,
                        "ignoring snapshot cleanup failure"
                    );
                }
                Ok(())
            }
            ReleasePolicy::Safe => {
                if self.exists() {
                    self.restore()?;
                }
                self.delete()
            }
        }
    }
}

impl<E: CommandExecutor> Drop for SnapshotManager<E> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.run_release() {
            warn!(database = %self.database, error = %err, "snapshot release failed");
        }
    }
}
