//! Durable player state. For now that is a single flag: whether the
//! player has subscribed past the level-3 paywall.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const SUBSCRIPTION_FILE: &str = "subscription.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize subscription record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct SubscriptionRecord {
    subscribed: bool,
}

/// Reads and writes the subscription flag under a data directory.
///
/// Reads degrade: a missing or unreadable file means "not subscribed",
/// never an error. Writes go through a temp file and rename so a crash
/// cannot leave a half-written record.
#[derive(Debug, Clone)]
pub struct SubscriptionStore {
    path: PathBuf,
}

impl SubscriptionStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(SUBSCRIPTION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_subscribed(&self) -> bool {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return false,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "subscription file unreadable");
                return false;
            }
        };
        match serde_json::from_slice::<SubscriptionRecord>(&bytes) {
            Ok(record) => record.subscribed,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "subscription file corrupt");
                false
            }
        }
    }

    pub fn set_subscribed(&self, subscribed: bool) -> Result<(), StorageError> {
        let record = SubscriptionRecord { subscribed };
        let text = serde_json::to_string_pretty(&record)?;
        self.write_atomic(&text).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), subscribed, "subscription record written");
        Ok(())
    }

    /// Stage the new record next to the old one, then swap. A reader sees
    /// either the previous record or the new one, never a torn write.
    fn write_atomic(&self, text: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let staged = self.path.with_extension("json.tmp");
        fs::write(&staged, text.as_bytes())?;

        let swapped = remove_if_present(&self.path).and_then(|_| fs::rename(&staged, &self.path));
        if swapped.is_err() {
            let _ = fs::remove_file(&staged);
        }
        swapped
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}
