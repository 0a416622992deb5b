use anyhow::{Context, Result, anyhow};
use colored::*;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};
use rpassword::read_password;

use crate::cli::Cli;
use dbsnapshot::{
    ConnectionDescriptor, ManagerState, ReleasePolicy, SnapshotError, SnapshotManager,
    SnapshotManagerBuilder,
};

/// Connection settings shared by every subcommand.
pub struct Target {
    descriptor: ConnectionDescriptor,
    database: String,
    work_root: Option<std::path::PathBuf>,
}

impl Target {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let raw = cli
            .connection
            .clone()
            .ok_or_else(|| {
                anyhow!("no connection string; pass --connection or set DBSNAPSHOT_CONNECTION")
            })?;
        let database = cli
            .database
            .clone()
            .ok_or_else(|| anyhow!("no database; pass --database or set DBSNAPSHOT_DATABASE"))?;

        let mut descriptor = ConnectionDescriptor::new(raw);
        if cli.ask_password {
            let password = prompt_password("Enter connection password: ")?;
            descriptor = descriptor.with_password(&password);
        }

        Ok(Self {
            descriptor,
            database,
            work_root: cli.work_root.clone(),
        })
    }

    fn manager(&self, policy: ReleasePolicy) -> Result<SnapshotManager> {
        let mut builder =
            SnapshotManagerBuilder::new(self.descriptor.clone(), self.database.clone())
                .policy(policy);
        if let Some(root) = &self.work_root {
            builder = builder.work_root(root);
        }
        Ok(builder.build()?)
    }
}

pub fn do_save(target: &Target, no_overwrite: bool) -> Result<()> {
    let mut manager = target.manager(ReleasePolicy::Basic)?;
    let bar = create_progress_bar(&format!("Backing up {}", target.database));

    match manager.save_with(!no_overwrite) {
        Ok(()) => {}
        Err(SnapshotError::ExistingSnapshot { path }) => {
            bar.finish_and_clear();
            manager.persist();
            eprintln!(
                "{} {}: {}",
                "!".yellow().bold(),
                "Warning".yellow(),
                format!("snapshot already exists at '{}'; skipping", path.display())
            );
            return Ok(());
        }
        Err(err) => {
            bar.finish_and_clear();
            manager.persist();
            return Err(err).context("snapshot failed");
        }
    }

    let path = manager.persist();
    bar.finish_with_message("Snapshot saved");
    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Saved snapshot of '{}' to {}", target.database, path.display()).green()
    );
    Ok(())
}

pub fn do_restore(target: &Target) -> Result<()> {
    let mut manager = target.manager(ReleasePolicy::Safe)?;
    if !manager.exists() {
        manager.persist();
        return Err(anyhow!("no snapshot of '{}' to restore", target.database));
    }

    let bar = create_progress_bar(&format!("Restoring {}", target.database));
    let result = manager.restore();
    manager.persist();
    bar.finish_and_clear();
    result.context("restore failed")?;

    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Restored '{}' from snapshot", target.database).green()
    );
    Ok(())
}

pub fn do_delete(target: &Target) -> Result<()> {
    let mut manager = target.manager(ReleasePolicy::Basic)?;
    let existed = manager.exists();
    let result = manager.delete();
    manager.persist();
    result?;

    if existed {
        println!(
            "{} {}",
            "✔".green().bold(),
            format!("Deleted snapshot of '{}'", target.database).green()
        );
    } else {
        println!("{} {}", "i".yellow().bold(), "No snapshot found".yellow());
    }
    Ok(())
}

pub fn do_status(target: &Target, json: bool) -> Result<()> {
    let manager = target.manager(ReleasePolicy::Basic)?;
    let state = manager.state();
    let info = manager.info();
    let work_dir = manager.work_dir().to_path_buf();
    manager.persist();
    let info = info?;

    if json {
        let out = serde_json::json!({
            "database": target.database,
            "state": match state {
                ManagerState::NoSnapshot => "no_snapshot",
                ManagerState::SnapshotPresent => "snapshot_present",
            },
            "work_dir": work_dir,
            "snapshot": info,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let Some(info) = info else {
        println!(
            "{} {}",
            "i".yellow().bold(),
            format!("No snapshot of '{}'", target.database).yellow()
        );
        return Ok(());
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Database").add_attribute(Attribute::Bold),
            Cell::new("Path").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Modified").add_attribute(Attribute::Bold),
            Cell::new("SHA-256").add_attribute(Attribute::Bold),
        ]);
    table.add_row(vec![
        Cell::new(&info.database),
        Cell::new(info.path.display()),
        Cell::new(format_size(info.size_bytes)),
        Cell::new(info.modified.format("%Y-%m-%d %H:%M:%S")),
        Cell::new(&info.sha256[..12]),
    ]);
    println!("{}", table);
    Ok(())
}

pub fn do_version() {
    println!("{} {}", "dbsnapshot".bold(), env!("CARGO_PKG_VERSION").cyan());
}

fn create_progress_bar(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    bar.set_message(prefix.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}

fn prompt_password(message: &str) -> Result<String> {
    eprint!("{} {}", "?".cyan().bold(), message.cyan());
    std::io::Write::flush(&mut std::io::stderr())?;
    let password = read_password()?; // input hidden
    Ok(password)
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
