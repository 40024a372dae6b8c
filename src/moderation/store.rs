//! Durable representation of the moderation table.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::types::UserKey;

/// On-disk shape of the moderation table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationSnapshot {
    #[serde(default)]
    pub warnings: BTreeMap<UserKey, u32>,
    #[serde(default, deserialize_with = "lenient_timestamps::deserialize")]
    pub banned: BTreeMap<UserKey, DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamps::deserialize_optional"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 timestamps as well as offset-less ones, read as UTC.
mod lenient_timestamps {
    use std::collections::BTreeMap;

    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    use crate::types::UserKey;

    fn parse<E: Error>(stamp: &str) -> Result<DateTime<Utc>, E> {
        DateTime::parse_from_rfc3339(stamp)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| stamp.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
            .map_err(|e| E::custom(format!("bad timestamp {stamp:?}: {e}")))
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<UserKey, DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<UserKey, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(user, stamp)| Ok((user, parse::<D::Error>(&stamp)?)))
            .collect()
    }

    pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|stamp| parse(&stamp))
            .transpose()
    }
}

/// Durable storage for [`ModerationSnapshot`]s.
pub trait ModerationStore: Send + Sync {
    /// Reads the stored table; `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<ModerationSnapshot>>;

    /// Replaces the stored table with `snapshot`.
    fn save(&self, snapshot: &ModerationSnapshot) -> Result<()>;
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ModerationStore for JsonFileStore {
    fn load(&self) -> Result<Option<ModerationSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BotError::Persistence(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        let snapshot = serde_json::from_slice(&bytes).map_err(|e| {
            BotError::Persistence(format!("corrupt data in {}: {e}", self.path.display()))
        })?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &ModerationSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &self.path)?;

        debug!("User data saved to {}", self.path.display());
        Ok(())
    }
}
