use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

use super::bottle::Bottle;

const MANIFEST_VERSION: &str = "1.0";

/// Export and import bottles as portable tar.gz archives
pub struct BackupManager;

impl BackupManager {
    /// Pack a bottle (manifest + prefix tree) into a tar.gz archive
    pub fn export_bottle(bottle: &Bottle, output_path: &Path) -> Result<()> {
        info!(name = %bottle.name, dest = %output_path.display(), "exporting bottle");

        let prefix_dir = prefix_dir_name(&bottle.prefix)?;
        let temp_dir =
            std::env::temp_dir().join(format!("cellar-export-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&temp_dir)?;

        let manifest = ExportManifest {
            name: bottle.name.clone(),
            prefix_dir: prefix_dir.to_string(),
            version: MANIFEST_VERSION.to_string(),
        };
        let manifest_content = serde_json::to_string_pretty(&manifest)?;
        fs::write(temp_dir.join("manifest.json"), manifest_content)?;

        copy_dir_all(&bottle.prefix, &temp_dir.join(prefix_dir))?;

        Self::create_archive(&temp_dir, output_path)?;
        fs::remove_dir_all(&temp_dir)?;

        info!(name = %bottle.name, "export complete");
        Ok(())
    }

    /// Restore a bottle from an archive into the bottle directory.
    /// Refuses to overwrite an existing prefix.
    pub fn import_bottle(
        archive_path: &Path,
        bottle_dir: &Path,
        wine_version: &str,
    ) -> Result<Bottle> {
        info!(archive = %archive_path.display(), "importing bottle");

        let temp_dir =
            std::env::temp_dir().join(format!("cellar-import-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&temp_dir)?;

        Self::extract_archive(archive_path, &temp_dir)?;

        let manifest_content = fs::read_to_string(temp_dir.join("manifest.json"))
            .context("Missing manifest.json in archive")?;
        let manifest: ExportManifest = serde_json::from_str(&manifest_content)
            .context("Could not parse the archive manifest")?;

        fs::create_dir_all(bottle_dir)?;
        let prefix_src = temp_dir.join(&manifest.prefix_dir);
        let prefix_dest = bottle_dir.join(&manifest.prefix_dir);
        if prefix_dest.exists() {
            fs::remove_dir_all(&temp_dir)?;
            anyhow::bail!("A machine already exists at {}", prefix_dest.display());
        }
        if !prefix_src.is_dir() {
            fs::remove_dir_all(&temp_dir)?;
            anyhow::bail!("Archive does not contain the prefix '{}'", manifest.prefix_dir);
        }

        copy_dir_all(&prefix_src, &prefix_dest)?;
        fs::remove_dir_all(&temp_dir)?;

        let bottle = Bottle::load(&prefix_dest, wine_version);
        info!(name = %bottle.name, "import complete");
        Ok(bottle)
    }

    fn create_archive(source_dir: &Path, output_path: &Path) -> Result<()> {
        let tar_gz = File::create(output_path)
            .with_context(|| format!("Could not create {}", output_path.display()))?;
        let enc = flate2::write::GzEncoder::new(tar_gz, flate2::Compression::default());
        let mut tar = tar::Builder::new(enc);

        tar.append_dir_all(".", source_dir)?;
        tar.finish()?;

        Ok(())
    }

    fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<()> {
        let tar_gz = File::open(archive_path)
            .with_context(|| format!("Could not open {}", archive_path.display()))?;
        let dec = flate2::read::GzDecoder::new(tar_gz);
        let mut archive = tar::Archive::new(dec);

        archive
            .unpack(dest_dir)
            .context("Could not extract the archive")?;

        Ok(())
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ExportManifest {
    name: String,
    prefix_dir: String,
    version: String,
}

fn prefix_dir_name(prefix: &Path) -> Result<&str> {
    prefix
        .file_name()
        .and_then(|n| n.to_str())
        .context("Prefix path has no directory name")
}

/// Recursively copy directory contents
fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let dst_path = dst.join(entry.file_name());

        if ty.is_dir() {
            copy_dir_all(&entry.path(), &dst_path)?;
        } else {
            fs::copy(entry.path(), dst_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bottle::BottleConfig;
    use tempfile::TempDir;

    fn fake_prefix(root: &Path, dir_name: &str, bottle_name: &str) -> Bottle {
        let prefix = root.join(dir_name);
        fs::create_dir_all(prefix.join("drive_c").join("windows")).unwrap();
        fs::write(prefix.join("drive_c").join("windows").join("win.ini"), "[fonts]\n").unwrap();
        Bottle::save_config(
            &prefix,
            &BottleConfig {
                name: bottle_name.to_string(),
            },
        )
        .unwrap();
        Bottle::load(&prefix, "8.0")
    }

    #[test]
    fn export_then_import_round_trips() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let bottle = fake_prefix(source.path(), "games", "Games Bottle");

        let archive = source.path().join("games.tar.gz");
        BackupManager::export_bottle(&bottle, &archive).unwrap();
        assert!(archive.is_file());

        let imported =
            BackupManager::import_bottle(&archive, &target.path().join("prefixes"), "8.0").unwrap();
        assert_eq!(imported.name, "Games Bottle");
        assert!(imported
            .prefix
            .join("drive_c")
            .join("windows")
            .join("win.ini")
            .is_file());
    }

    #[test]
    fn import_refuses_an_existing_machine() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let bottle = fake_prefix(source.path(), "games", "Games Bottle");

        let archive = source.path().join("games.tar.gz");
        BackupManager::export_bottle(&bottle, &archive).unwrap();

        fs::create_dir_all(target.path().join("games")).unwrap();
        let result = BackupManager::import_bottle(&archive, target.path(), "8.0");
        assert!(result.is_err());
    }
}
