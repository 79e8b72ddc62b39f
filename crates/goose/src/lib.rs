use anyhow::{bail, Context, Result};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Runs goose SQL migrations by spawning the goose binary
///
/// The schema for the device store lives in goose-format SQL files; this
/// wrapper only knows how to invoke `goose -dir <dir> <driver> <dsn> <command>`.
pub struct MigrationRunner {
    goose_binary_path: String,
    migrations_dir: String,
    driver: String,
    dsn: String,
}

impl MigrationRunner {
    /// # Arguments
    /// * `goose_binary_path` - goose executable, either on `PATH` or absolute
    /// * `migrations_dir` - directory holding the migration SQL files
    /// * `driver` - goose driver name, e.g. "postgres"
    /// * `dsn` - connection string in the driver's format
    pub fn new(
        goose_binary_path: String,
        migrations_dir: String,
        driver: String,
        dsn: String,
    ) -> Self {
        Self {
            goose_binary_path,
            migrations_dir,
            driver,
            dsn,
        }
    }

    /// Apply all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        debug!("running migrations from directory: {}", self.migrations_dir);
        let output = self.goose("up").await?;
        debug!(
            "migrations completed successfully:\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
        Ok(())
    }

    fn command(&self, goose_command: &str) -> Command {
        let mut command = Command::new(&self.goose_binary_path);
        command
            .arg("-dir")
            .arg(&self.migrations_dir)
            .arg(&self.driver)
            .arg(&self.dsn)
            .arg(goose_command);
        command
    }

    async fn goose(&self, goose_command: &str) -> Result<Output> {
        let output = self
            .command(goose_command)
            .output()
            .await
            .with_context(|| format!("Failed to spawn goose at {}", self.goose_binary_path))?;

        if !output.status.success() {
            bail!(
                "goose {} failed.\nstdout: {}\nstderr: {}",
                goose_command,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(output)
    }
}
