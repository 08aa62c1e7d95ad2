use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::registry;
use crate::core::types::{AudioDriver, Bit, WindowsVersion};

const BOTTLE_CONFIG: &str = "bottle.json";
const UPDATE_TIMESTAMP: &str = ".update-timestamp";

/// User-editable bottle settings stored at the prefix root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleConfig {
    pub name: String,
}

/// A Wine bottle: one prefix directory plus everything we can read out of it
#[derive(Debug, Clone)]
pub struct Bottle {
    pub name: String,
    pub prefix: PathBuf,
    pub status_ok: bool,
    pub windows: WindowsVersion,
    pub bit: Bit,
    pub wine_version: String,
    pub c_drive: PathBuf,
    pub last_updated: Option<String>,
    pub audio_driver: AudioDriver,
    pub virtual_desktop: Option<String>,
    pub disk_usage: u64,
}

impl Bottle {
    /// Inspect a prefix directory and build the bottle view of it.
    ///
    /// Unreadable details degrade to defaults (and clear the ready status)
    /// instead of failing the whole scan.
    pub fn load(prefix: &Path, wine_version: &str) -> Bottle {
        let name = match Self::load_config(prefix) {
            Ok(Some(config)) => config.name,
            Ok(None) => Self::name_from_prefix(prefix),
            Err(err) => {
                warn!(prefix = %prefix.display(), %err, "unreadable bottle config");
                Self::name_from_prefix(prefix)
            }
        };

        let windows = registry::windows_version(prefix);
        let status_ok = prefix.join("dosdevices").is_dir()
            && prefix.join(registry::SYSTEM_REG).is_file()
            && windows.is_ok();
        let windows = windows.unwrap_or_else(|err| {
            warn!(prefix = %prefix.display(), %err, "could not read the Windows version");
            WindowsVersion::WindowsXP
        });
        let bit = registry::system_bit(prefix).unwrap_or_else(|err| {
            warn!(prefix = %prefix.display(), %err, "could not read the architecture");
            Bit::Win32
        });

        Bottle {
            name,
            prefix: prefix.to_path_buf(),
            status_ok,
            windows,
            bit,
            wine_version: wine_version.to_string(),
            c_drive: prefix.join("dosdevices").join("c:"),
            last_updated: Self::last_updated(prefix),
            audio_driver: registry::audio_driver(prefix),
            virtual_desktop: registry::virtual_desktop(prefix),
            disk_usage: directory_size(prefix),
        }
    }

    /// Scan a directory for bottle prefixes, sorted by name.
    /// The directory is created when it does not exist yet.
    pub fn scan_directory(dir: &Path, wine_version: &str) -> Result<Vec<Bottle>> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create the bottle directory {}", dir.display()))?;
            return Ok(Vec::new());
        }

        let mut bottles = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Could not read the bottle directory {}", dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                bottles.push(Bottle::load(&path, wine_version));
            }
        }

        bottles.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(bottles)
    }

    /// Persist a new display name to the bottle config
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            anyhow::bail!("The machine name cannot be empty");
        }
        self.name = new_name.to_string();
        Self::save_config(
            &self.prefix,
            &BottleConfig {
                name: self.name.clone(),
            },
        )
    }

    pub fn load_config(prefix: &Path) -> Result<Option<BottleConfig>> {
        let path = prefix.join(BOTTLE_CONFIG);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Could not parse {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save_config(prefix: &Path, config: &BottleConfig) -> Result<()> {
        let path = prefix.join(BOTTLE_CONFIG);
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&path, content).with_context(|| format!("Could not write {}", path.display()))?;
        Ok(())
    }

    /// Fallback bottle name: the prefix directory, without a hidden-dir dot
    fn name_from_prefix(prefix: &Path) -> String {
        let dir_name = prefix
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("- Unknown -");
        dir_name.trim_start_matches('.').to_string()
    }

    /// Render the wine .update-timestamp epoch as a local date/time
    fn last_updated(prefix: &Path) -> Option<String> {
        let content = fs::read_to_string(prefix.join(UPDATE_TIMESTAMP)).ok()?;
        format_epoch(content.lines().next()?)
    }
}

fn format_epoch(epoch: &str) -> Option<String> {
    let secs: i64 = epoch.trim().parse().ok()?;
    let timestamp = Local.timestamp_opt(secs, 0).single()?;
    Some(timestamp.format("%c").to_string())
}

/// Recursive size of a directory in bytes
fn directory_size(dir: &Path) -> u64 {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|metadata| metadata.is_file())
        .map(|metadata| metadata.len())
        .sum()
}

/// Human readable byte size for the detail panel
pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn name_falls_back_to_directory_without_dot() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join(".my-bottle");
        fs::create_dir_all(&prefix).unwrap();

        let bottle = Bottle::load(&prefix, "8.0");
        assert_eq!(bottle.name, "my-bottle");
        assert!(!bottle.status_ok);
    }

    #[test]
    fn config_name_wins_over_directory_name() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("dir-name");
        fs::create_dir_all(&prefix).unwrap();
        Bottle::save_config(
            &prefix,
            &BottleConfig {
                name: "Fancy Name".to_string(),
            },
        )
        .unwrap();

        let bottle = Bottle::load(&prefix, "8.0");
        assert_eq!(bottle.name, "Fancy Name");
    }

    #[test]
    fn rename_persists_to_the_config() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("bottle");
        fs::create_dir_all(&prefix).unwrap();

        let mut bottle = Bottle::load(&prefix, "8.0");
        bottle.rename("Renamed").unwrap();
        assert!(bottle.rename("   ").is_err());

        let config = Bottle::load_config(&prefix).unwrap().unwrap();
        assert_eq!(config.name, "Renamed");
        assert_eq!(Bottle::load(&prefix, "8.0").name, "Renamed");
    }

    #[test]
    fn scan_skips_plain_files_and_sorts_by_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("zeta")).unwrap();
        fs::create_dir_all(dir.path().join("Alpha")).unwrap();
        fs::write(dir.path().join("stray-file"), "x").unwrap();

        let bottles = Bottle::scan_directory(dir.path(), "8.0").unwrap();
        let names: Vec<_> = bottles.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zeta"]);
    }

    #[test]
    fn scan_creates_a_missing_directory() {
        let dir = TempDir::new().unwrap();
        let bottles_dir = dir.path().join("prefixes");
        let bottles = Bottle::scan_directory(&bottles_dir, "8.0").unwrap();
        assert!(bottles.is_empty());
        assert!(bottles_dir.is_dir());
    }

    #[test]
    fn epoch_formatting() {
        assert!(format_epoch("1603487380").is_some());
        assert!(format_epoch("not-a-number").is_none());
        assert!(format_epoch("").is_none());
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
