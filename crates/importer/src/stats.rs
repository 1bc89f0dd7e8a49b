//! Process-wide counters and the append-only error log.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::{error, info, warn};

use crate::error::ImportError;

/// Counters accumulated over one batch run.
///
/// The final report is the verbatim counter snapshot; it never raises and
/// carries no exit semantics of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub total_entries: u64,
    pub users_created: u64,
    pub users_skipped: u64,
    pub shops_created: u64,
    pub shops_skipped: u64,
    pub services_created: u64,
    pub services_skipped: u64,
    pub categories_created: u64,
    pub categories_skipped: u64,
    pub sub_categories_created: u64,
    pub sub_categories_skipped: u64,
    pub designs_created: u64,
    pub tags_created: u64,
    pub reviews_created: u64,
    pub subscriptions_created: u64,
    pub business_applications_created: u64,
    pub errors: u64,
}

impl ImportStats {
    /// Emit the final counter table.
    pub fn report(&self) {
        info!("Import completed!");
        info!("Final statistics:");
        info!("  Total entries processed: {}", self.total_entries);
        info!(
            "  Users created: {} (skipped: {})",
            self.users_created, self.users_skipped
        );
        info!(
            "  Shops created: {} (skipped: {})",
            self.shops_created, self.shops_skipped
        );
        info!(
            "  Services created: {} (skipped: {})",
            self.services_created, self.services_skipped
        );
        info!(
            "  Categories created: {} (skipped: {})",
            self.categories_created, self.categories_skipped
        );
        info!(
            "  Subcategories created: {} (skipped: {})",
            self.sub_categories_created, self.sub_categories_skipped
        );
        info!("  Designs created: {}", self.designs_created);
        info!("  Tags created: {}", self.tags_created);
        info!("  Reviews created: {}", self.reviews_created);
        info!("  Subscriptions created: {}", self.subscriptions_created);
        info!(
            "  Business applications created: {}",
            self.business_applications_created
        );
        info!("  Errors encountered: {}", self.errors);

        if self.errors == 0 {
            info!("All entries processed successfully");
        } else {
            warn!(errors = self.errors, "Completed with errors; check the error log");
        }
    }
}

/// Durable append-only failure log.
///
/// The file is truncated once when the log is created so repeated runs do
/// not accumulate stale entries. Each failure appends one timestamped block:
///
/// ```text
/// [2026-08-07T10:15:30.123Z] Error processing entry 3 (Dr. X)
/// store error: ...
///
/// ```
///
/// Appends are infallible from the pipeline's perspective: a write failure
/// degrades to a `tracing` warning so the batch keeps running.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Create the log, truncating any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::LogInit`] if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref().to_path_buf();
        File::create(&path).map_err(|source| ImportError::LogInit {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    /// Append a failure block and mirror it to the console.
    pub fn log_failure(&self, context: &str, detail: &dyn Display) {
        error!("{context}: {detail}");

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let block = format!("[{timestamp}] {context}\n{detail}\n\n");
        if let Err(e) = self.append(&block) {
            warn!(path = %self.path.display(), error = %e, "Failed to write to error log");
        }
    }

    /// Path of the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, block: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(block.as_bytes())
    }
}
