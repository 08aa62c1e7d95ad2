use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tracing::{debug, warn};

use crate::core::types::Bit;

pub const WINE_EXECUTABLE: &str = "wine";

/// Exit code the coreutils `timeout` command uses to report expiry
const TIMEOUT_EXPIRED: i32 = 124;

/// Wine version of the system-wide wine binary (e.g. "8.0.2")
pub fn wine_version() -> Result<String> {
    let output = Command::new(WINE_EXECUTABLE)
        .arg("--version")
        .output()
        .context("Could not run wine. Is Wine installed?")?;
    if !output.status.success() {
        anyhow::bail!("wine --version exited with {}", output.status);
    }
    parse_wine_version(&String::from_utf8_lossy(&output.stdout))
}

/// Extract "8.0.2" from "wine-8.0.2 (Staging)" style output
fn parse_wine_version(output: &str) -> Result<String> {
    let line = output.trim();
    let version = line
        .strip_prefix("wine-")
        .and_then(|rest| rest.split_whitespace().next())
        .filter(|v| !v.is_empty())
        .context("Could not determine the Wine version")?;
    Ok(version.to_string())
}

/// Wine command-line for launching a Windows program
pub fn windows_program_args(program: &Path, is_msi: bool) -> Vec<OsString> {
    if is_msi {
        vec![
            OsString::from("msiexec"),
            OsString::from("/i"),
            program.as_os_str().to_os_string(),
        ]
    } else {
        vec![
            OsString::from("start"),
            OsString::from("/unix"),
            program.as_os_str().to_os_string(),
        ]
    }
}

/// Boot a fresh Wine prefix.
///
/// Blocking; intended for worker threads. Gecko and Mono installation is
/// suppressed via DLL overrides when requested.
pub fn create_prefix(prefix: &Path, bit: Bit, disable_gecko_mono: bool) -> Result<()> {
    let mut cmd = Command::new(WINE_EXECUTABLE);
    cmd.arg("wineboot")
        .env("WINEPREFIX", prefix)
        .env("WINEARCH", bit.wine_arch())
        .stdout(Stdio::null());
    if disable_gecko_mono {
        cmd.env("WINEDLLOVERRIDES", "mscoree=d;mshtml=d");
    }

    let output = cmd
        .output()
        .context("Could not run wine wineboot. Is Wine installed?")?;
    if !output.status.success() {
        debug!(
            stderr = %String::from_utf8_lossy(&output.stderr),
            "wineboot failed"
        );
        anyhow::bail!(
            "Something went wrong while creating the new machine at {}",
            prefix.display()
        );
    }
    Ok(())
}

/// Delete a Wine prefix from disk. Refuses anything that is not a directory.
pub fn remove_prefix(prefix: &Path) -> Result<()> {
    if !prefix.is_dir() {
        anyhow::bail!(
            "Could not remove machine, prefix is not a directory: {}",
            prefix.display()
        );
    }
    fs::remove_dir_all(prefix)
        .with_context(|| format!("Could not remove prefix {}", prefix.display()))?;
    Ok(())
}

/// Spawn `wine <args>` inside a prefix, detached into its own process group
/// so the launched application is not tied to UI interactions.
pub fn spawn_wine(prefix: &Path, args: &[OsString], capture_output: bool) -> Result<Child> {
    let mut cmd = Command::new(WINE_EXECUTABLE);
    cmd.args(args).env("WINEPREFIX", prefix);
    if capture_output {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    unsafe {
        cmd.pre_exec(|| {
            libc::setpgid(0, 0);
            Ok(())
        });
    }

    cmd.spawn()
        .with_context(|| format!("Could not launch wine in {}", prefix.display()))
}

/// Spawn an arbitrary host command with WINEPREFIX set (e.g. winetricks),
/// detached like `spawn_wine`.
pub fn spawn_in_prefix(prefix: &Path, program: &Path, args: &[OsString]) -> Result<Child> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env("WINEPREFIX", prefix)
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    unsafe {
        cmd.pre_exec(|| {
            libc::setpgid(0, 0);
            Ok(())
        });
    }

    cmd.spawn().with_context(|| {
        format!(
            "Could not launch {} in {}",
            program.display(),
            prefix.display()
        )
    })
}

/// Wait for a spawned child and report whether it exited cleanly.
/// Captured output goes to the debug log.
pub fn wait_and_trace(child: Child, label: &str) -> bool {
    match child.wait_with_output() {
        Ok(output) => {
            if !output.stderr.is_empty() {
                debug!(%label, stderr = %String::from_utf8_lossy(&output.stderr), "program output");
            }
            if !output.status.success() {
                warn!(%label, status = %output.status, "program exited with an error");
            }
            output.status.success()
        }
        Err(err) => {
            warn!(%label, %err, "could not wait for program");
            false
        }
    }
}

/// Blocking wait until the wineserver of the prefix has terminated,
/// bounded by a 60 second timeout.
pub fn wait_for_wineserver(prefix: &Path) {
    let status = Command::new("timeout")
        .args(["60", "wineserver", "-w"])
        .env("WINEPREFIX", prefix)
        .status();
    match status {
        Ok(status) if status.code() == Some(TIMEOUT_EXPIRED) => {
            warn!(prefix = %prefix.display(), "wineserver is still running after 60s");
        }
        Ok(_) => {}
        Err(err) => warn!(%err, "could not wait for wineserver"),
    }
}

/// Uninstaller GUID of an installed application, looked up by display name
pub fn wine_guid(prefix: &Path, application_name: &str) -> Option<String> {
    let output = Command::new(WINE_EXECUTABLE)
        .args(["uninstaller", "--list"])
        .env("WINEPREFIX", prefix)
        .output()
        .ok()?;
    parse_guid_from_listing(&String::from_utf8_lossy(&output.stdout), application_name)
}

/// Extract the `{...}` GUID from a `wine uninstaller --list` line that
/// mentions the application.
fn parse_guid_from_listing(listing: &str, application_name: &str) -> Option<String> {
    let line = listing
        .lines()
        .find(|line| line.contains(application_name))?;
    let start = line.find('{')?;
    let end = line[start..].find('}')? + start;
    Some(line[start + 1..end].to_string())
}

/// Open a path with the desktop's default handler
pub fn open_path(path: &Path) -> Result<()> {
    Command::new("xdg-open")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Could not open {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn parses_plain_wine_version() {
        assert_eq!(parse_wine_version("wine-8.0.2\n").unwrap(), "8.0.2");
    }

    #[test]
    fn parses_staging_wine_version() {
        assert_eq!(parse_wine_version("wine-9.3 (Staging)\n").unwrap(), "9.3");
    }

    #[test]
    fn rejects_unexpected_version_output() {
        assert!(parse_wine_version("").is_err());
        assert!(parse_wine_version("not wine at all").is_err());
    }

    #[test]
    fn msi_programs_run_through_msiexec() {
        let args = windows_program_args(&PathBuf::from("/tmp/setup.msi"), true);
        assert_eq!(args[0], "msiexec");
        assert_eq!(args[1], "/i");
        assert_eq!(args[2], "/tmp/setup.msi");
    }

    #[test]
    fn exe_programs_run_through_start_unix() {
        let args = windows_program_args(&PathBuf::from("/tmp/game.exe"), false);
        assert_eq!(args[0], "start");
        assert_eq!(args[1], "/unix");
        assert_eq!(args[2], "/tmp/game.exe");
    }

    #[test]
    fn guid_is_extracted_from_uninstaller_listing() {
        let listing = "\
{30e1e983-91basc3d9}|||Some Other App\n\
{de2dad58-de50-593b-9d74-08e914b75cd3}|||Wine Mono Runtime\n";
        assert_eq!(
            parse_guid_from_listing(listing, "Wine Mono Runtime").as_deref(),
            Some("de2dad58-de50-593b-9d74-08e914b75cd3")
        );
        assert_eq!(parse_guid_from_listing(listing, "Absent App"), None);
        assert_eq!(parse_guid_from_listing("no braces here", "no braces"), None);
    }

    #[test]
    fn remove_prefix_refuses_non_directories() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-prefix");
        std::fs::write(&file, "x").unwrap();
        assert!(remove_prefix(&file).is_err());

        let prefix = dir.path().join("prefix");
        std::fs::create_dir_all(prefix.join("drive_c")).unwrap();
        remove_prefix(&prefix).unwrap();
        assert!(!prefix.exists());
    }
}
