use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::{info, warn};

use crate::core::backup::BackupManager;
use crate::core::bottle::Bottle;
use crate::core::config::AppConfig;
use crate::core::registry;
use crate::core::types::{
    AudioDriver, Bit, DllLoadOrder, WindowsVersion, DEFAULT_AUDIO_DRIVER, DEFAULT_WINDOWS,
};
use crate::core::wine;
use crate::core::winetricks::{Package, Winetricks};

/// Everything the new-bottle assistant collects
#[derive(Debug, Clone)]
pub struct NewBottleParams {
    pub name: String,
    pub windows: WindowsVersion,
    pub bit: Bit,
    pub audio_driver: AudioDriver,
    /// None leaves the virtual desktop disabled
    pub virtual_desktop_resolution: Option<String>,
    pub disable_gecko_mono: bool,
}

/// Wine maintenance tools reachable from the settings window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Uninstaller,
    Notepad,
    Wordpad,
    InternetExplorer,
    TaskManager,
    RegistryEditor,
    Explorer,
    Console,
    Winecfg,
    WinetricksGui,
}

impl Tool {
    /// The Windows command wine runs for this tool; the winetricks GUI is
    /// the only tool that is not a wine program.
    pub fn wine_command(self) -> Option<&'static str> {
        match self {
            Tool::Uninstaller => Some("uninstaller"),
            Tool::Notepad => Some("notepad"),
            Tool::Wordpad => Some("wordpad"),
            Tool::InternetExplorer => Some("iexplore"),
            Tool::TaskManager => Some("taskmgr"),
            Tool::RegistryEditor => Some("regedit"),
            Tool::Explorer => Some("explorer"),
            Tool::Console => Some("wineconsole"),
            Tool::Winecfg => Some("winecfg"),
            Tool::WinetricksGui => None,
        }
    }
}

/// Per-bottle install state of everything the settings window offers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstalledPackages {
    pub d3dx9: bool,
    pub dxvk: bool,
    pub liberation_fonts: bool,
    pub core_fonts: bool,
    pub visual_cpp: bool,
    pub dotnet4: bool,
    pub dotnet452: bool,
}

/// The controller: owns the bottle list and the active bottle, and performs
/// every domain operation the UI can trigger.
pub struct BottleManager {
    data_dir: PathBuf,
    config: AppConfig,
    winetricks: Winetricks,
    bottles: Vec<Bottle>,
    active: Option<Bottle>,
    wine_version: String,
    creating: bool,
}

impl BottleManager {
    pub fn new(data_dir: PathBuf) -> Self {
        let config = AppConfig::load(&data_dir);
        let winetricks = Winetricks::new(&data_dir);
        Self {
            data_dir,
            config,
            winetricks,
            bottles: Vec::new(),
            active: None,
            wine_version: String::new(),
            creating: false,
        }
    }

    /// Called once at startup: make sure winetricks is available, then do
    /// the initial scan. A failing self-update is not fatal.
    pub fn prepare(&mut self) -> Result<()> {
        if !self.winetricks.is_installed() {
            self.winetricks
                .install()
                .context("Could not install the winetricks helper script")?;
        } else if let Err(err) = self.winetricks.self_update() {
            warn!(%err, "winetricks self-update failed");
        }

        self.update_bottles()
    }

    /// Re-read all bottles from disk. The first bottle becomes active;
    /// an empty list resets the active bottle.
    pub fn update_bottles(&mut self) -> Result<()> {
        self.wine_version = wine::wine_version()?;
        self.bottles = Bottle::scan_directory(&self.config.bottle_dir, &self.wine_version)?;
        info!(count = self.bottles.len(), "bottles loaded");

        self.active = self.bottles.first().cloned();
        Ok(())
    }

    pub fn bottles(&self) -> &[Bottle] {
        &self.bottles
    }

    pub fn active(&self) -> Option<&Bottle> {
        self.active.as_ref()
    }

    pub fn set_active(&mut self, bottle: Bottle) {
        self.active = Some(bottle);
    }

    pub fn reset_active(&mut self) {
        self.active = None;
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Persist new preferences; the caller rescans afterwards since the
    /// bottle directory may have changed.
    pub fn save_config(&mut self, config: AppConfig) -> Result<()> {
        config.save(&self.data_dir)?;
        self.config = config;
        Ok(())
    }

    pub fn creation_in_progress(&self) -> bool {
        self.creating
    }

    /// Clear the single-creation guard once the worker reported back
    pub fn creation_finished(&mut self) {
        self.creating = false;
    }

    fn require_active(&self) -> Result<&Bottle> {
        self.active.as_ref().context(
            "No machine selected/empty. First create a new machine!\n\nAborted.",
        )
    }

    /// Create a new bottle on a worker thread. `on_done` is invoked from
    /// that thread with the outcome.
    pub fn new_bottle(
        &mut self,
        params: NewBottleParams,
        on_done: impl FnOnce(Result<()>) + Send + 'static,
    ) -> Result<()> {
        if self.creating {
            anyhow::bail!("A machine is already being created. Please wait...");
        }

        let name = sanitize_name(&params.name);
        if name.is_empty() {
            anyhow::bail!("The machine name cannot be empty");
        }
        let prefix = self.config.bottle_dir.join(&name);
        if prefix.exists() {
            anyhow::bail!("A machine named '{}' already exists", name);
        }

        self.creating = true;
        let winetricks = self.winetricks.clone();
        thread::spawn(move || {
            on_done(create_bottle_worker(&winetricks, &prefix, &name, &params));
        });
        Ok(())
    }

    /// Delete the active bottle's prefix. The UI asks for confirmation
    /// before calling this.
    pub fn delete_active(&mut self) -> Result<()> {
        let bottle = self.require_active()?;
        wine::remove_prefix(&bottle.prefix)?;
        info!(name = %bottle.name, "machine removed");
        self.reset_active();
        Ok(())
    }

    /// Persist a new name for the active bottle
    pub fn rename_active(&mut self, new_name: &str) -> Result<()> {
        match self.active.as_mut() {
            Some(bottle) => bottle.rename(new_name),
            None => anyhow::bail!(
                "No machine selected/empty. First create a new machine!\n\nAborted."
            ),
        }
    }

    /// Run a Windows program (exe or msi) in the active bottle. `on_exit`
    /// fires from the waiter thread with the success flag.
    pub fn run_program(
        &self,
        filename: &Path,
        on_exit: impl FnOnce(bool) + Send + 'static,
    ) -> Result<()> {
        let bottle = self.require_active()?;
        let args = wine::windows_program_args(filename, is_msi_file(filename));
        let child = wine::spawn_wine(&bottle.prefix, &args, self.config.enable_tracing)?;
        info!(program = %filename.display(), bottle = %bottle.name, "program launched");

        let label = filename.display().to_string();
        thread::spawn(move || {
            on_exit(wine::wait_and_trace(child, &label));
        });
        Ok(())
    }

    /// Open the C: drive of the active bottle in the file manager
    pub fn open_c_drive(&self) -> Result<()> {
        let bottle = self.require_active()?;
        wine::open_path(&bottle.c_drive).context("Could not open the C:/ drive.")
    }

    pub fn reboot(&self) -> Result<()> {
        self.run_wineboot("-r")
    }

    pub fn update_config_in_bottle(&self) -> Result<()> {
        self.run_wineboot("-u")
    }

    pub fn kill_processes(&self) -> Result<()> {
        self.run_wineboot("-k")
    }

    fn run_wineboot(&self, flag: &str) -> Result<()> {
        let bottle = self.require_active()?;
        let args = vec![OsString::from("wineboot"), OsString::from(flag)];
        let child = wine::spawn_wine(&bottle.prefix, &args, false)?;
        let label = format!("wineboot {}", flag);
        thread::spawn(move || {
            wine::wait_and_trace(child, &label);
        });
        Ok(())
    }

    /// Launch one of the Wine maintenance tools in the active bottle
    pub fn open_tool(&self, tool: Tool) -> Result<()> {
        let bottle = self.require_active()?;
        let child = match tool.wine_command() {
            Some(command) => {
                wine::spawn_wine(&bottle.prefix, &[OsString::from(command)], false)?
            }
            None => wine::spawn_in_prefix(
                &bottle.prefix,
                self.winetricks.script_path(),
                &[OsString::from("--gui")],
            )?,
        };
        let label = format!("{:?}", tool);
        thread::spawn(move || {
            wine::wait_and_trace(child, &label);
        });
        Ok(())
    }

    /// Install a component package with winetricks on a worker thread.
    /// `.NET` installs remove Wine Mono first.
    pub fn install_package(
        &self,
        package: Package,
        on_done: impl FnOnce(Result<()>) + Send + 'static,
    ) -> Result<()> {
        let bottle = self.require_active()?;
        let prefix = bottle.prefix.clone();
        let winetricks = self.winetricks.clone();
        thread::spawn(move || {
            on_done(install_package_worker(&winetricks, &prefix, &package));
        });
        Ok(())
    }

    /// Query the install state of every package for the active bottle.
    /// Without an active bottle everything reads as not installed.
    pub fn installed_packages(&self) -> InstalledPackages {
        let Some(bottle) = self.active.as_ref() else {
            return InstalledPackages::default();
        };
        let prefix = bottle.prefix.as_path();

        InstalledPackages {
            d3dx9: registry::dll_override(prefix, "*d3dx9_43", DllLoadOrder::Native),
            dxvk: registry::dll_override(prefix, "*dxgi", DllLoadOrder::Native),
            liberation_fonts: registry::font_filename(
                prefix,
                bottle.bit,
                "Liberation Mono (TrueType)",
            )
            .is_some_and(|f| f == "liberationmono-regular.ttf"),
            core_fonts: registry::font_filename(prefix, bottle.bit, "Comic Sans MS (TrueType)")
                .is_some_and(|f| f == "comic.ttf"),
            visual_cpp: is_visual_cpp_installed(prefix),
            dotnet4: is_dotnet_installed(
                prefix,
                "Microsoft .NET Framework 4 Extended",
                "Microsoft .NET Framework 4 Extended",
            ),
            dotnet452: is_dotnet_installed(
                prefix,
                "{92FB6C44-E685-45AD-9B20-CADF4CABA132}",
                "Microsoft .NET Framework 4.5.2",
            ),
        }
    }

    /// Export the active bottle to a tar.gz archive
    pub fn export_active(&self, dest: &Path) -> Result<()> {
        let bottle = self.require_active()?;
        BackupManager::export_bottle(bottle, dest)
    }

    /// Import a bottle archive into the bottle directory
    pub fn import_bottle(&mut self, archive: &Path) -> Result<Bottle> {
        BackupManager::import_bottle(archive, &self.config.bottle_dir, &self.wine_version)
    }
}

/// Worker body for bottle creation: boot the prefix, apply the non-default
/// settings, then wait for the wineserver to settle.
fn create_bottle_worker(
    winetricks: &Winetricks,
    prefix: &Path,
    name: &str,
    params: &NewBottleParams,
) -> Result<()> {
    wine::create_prefix(prefix, params.bit, params.disable_gecko_mono)
        .with_context(|| format!("Something went wrong while creating machine '{}'", name))?;

    if params.windows != DEFAULT_WINDOWS {
        winetricks
            .set_windows_version(prefix, params.windows)
            .context("Something went wrong while setting the Windows version")?;
    }
    if let Some(resolution) = &params.virtual_desktop_resolution {
        winetricks
            .set_virtual_desktop(prefix, resolution)
            .context("Something went wrong while enabling the virtual desktop")?;
    }
    if params.audio_driver != DEFAULT_AUDIO_DRIVER {
        winetricks
            .set_audio_driver(prefix, params.audio_driver)
            .context("Something went wrong while setting the audio driver")?;
    }

    Bottle::save_config(
        prefix,
        &crate::core::bottle::BottleConfig {
            name: name.to_string(),
        },
    )?;

    wine::wait_for_wineserver(prefix);
    info!(%name, "machine created");
    Ok(())
}

fn install_package_worker(winetricks: &Winetricks, prefix: &Path, package: &Package) -> Result<()> {
    // Native .NET and Wine Mono do not coexist
    if matches!(package, Package::DotNet { .. }) {
        if let Some(guid) = wine::wine_guid(prefix, "Wine Mono Runtime") {
            info!(%guid, "removing Wine Mono before the .NET install");
            let args = vec![
                OsString::from("uninstaller"),
                OsString::from("--remove"),
                OsString::from(format!("{{{}}}", guid)),
            ];
            let child = wine::spawn_wine(prefix, &args, false)?;
            wine::wait_and_trace(child, "uninstall Wine Mono");
        }
    }

    let status = Command::new(winetricks.script_path())
        .args(Winetricks::install_args(package))
        .env("WINEPREFIX", prefix)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("Could not run winetricks")?;
    if !status.success() {
        anyhow::bail!("Installing {} failed", package.verb());
    }

    wine::wait_for_wineserver(prefix);
    Ok(())
}

fn is_visual_cpp_installed(prefix: &Path) -> bool {
    if !registry::dll_override(prefix, "*msvcp120", DllLoadOrder::NativeBuiltin) {
        return false;
    }
    // 32-bit package first, 64-bit as fallback
    ["{61087a79-ac85-455c-934d-1fa22cc64f36}", "{ef6b00ec-13e1-4c25-9064-b2f383cb8412}"]
        .iter()
        .any(|guid| {
            registry::uninstaller_display_name(prefix, guid)
                .is_some_and(|name| name.starts_with("Microsoft Visual C++ 2013 Redistributable"))
        })
}

fn is_dotnet_installed(prefix: &Path, uninstaller_key: &str, display_name: &str) -> bool {
    registry::dll_override(prefix, "*mscoree", DllLoadOrder::Native)
        && registry::uninstaller_display_name(prefix, uninstaller_key)
            .is_some_and(|name| name == display_name)
}

/// Make a user-entered machine name safe to use as a directory name
fn sanitize_name(name: &str) -> String {
    name.trim()
        .replace(['/', '\\'], "_")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

/// Just guess based on the file extension
fn is_msi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("msi"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn manager_with_bottle(dir: &TempDir) -> (BottleManager, Bottle) {
        let prefix = dir.path().join("prefixes").join("test-bottle");
        fs::create_dir_all(&prefix).unwrap();
        let bottle = Bottle::load(&prefix, "8.0");
        let manager = BottleManager::new(dir.path().to_path_buf());
        (manager, bottle)
    }

    #[test]
    fn set_then_reset_leaves_no_active_bottle() {
        let dir = TempDir::new().unwrap();
        let (mut manager, bottle) = manager_with_bottle(&dir);

        manager.set_active(bottle.clone());
        assert_eq!(manager.active().map(|b| b.name.as_str()), Some("test-bottle"));

        manager.reset_active();
        assert!(manager.active().is_none());
    }

    #[test]
    fn operations_without_an_active_bottle_fail() {
        let dir = TempDir::new().unwrap();
        let manager = BottleManager::new(dir.path().to_path_buf());

        assert!(manager.open_c_drive().is_err());
        assert!(manager.reboot().is_err());
        assert!(manager
            .run_program(Path::new("/tmp/setup.exe"), |_| {})
            .is_err());
    }

    #[test]
    fn no_active_bottle_means_nothing_installed() {
        let dir = TempDir::new().unwrap();
        let manager = BottleManager::new(dir.path().to_path_buf());
        assert_eq!(manager.installed_packages(), InstalledPackages::default());
    }

    #[test]
    fn dll_override_predicates_read_the_prefix_registry() {
        let dir = TempDir::new().unwrap();
        let (mut manager, _) = manager_with_bottle(&dir);

        let prefix = dir.path().join("prefixes").join("with-dxvk");
        fs::create_dir_all(&prefix).unwrap();
        fs::write(
            prefix.join("user.reg"),
            "WINE REGISTRY Version 2\n#arch=win64\n\n\
             [Software\\\\Wine\\\\DllOverrides] 1\n\"*dxgi\"=\"native\"\n",
        )
        .unwrap();
        manager.set_active(Bottle::load(&prefix, "8.0"));

        let installed = manager.installed_packages();
        assert!(installed.dxvk);
        assert!(!installed.d3dx9);
        assert!(!installed.dotnet4);
    }

    #[test]
    fn names_are_sanitized_for_the_filesystem() {
        assert_eq!(sanitize_name("  My Game/Bottle  "), "My Game_Bottle");
        assert_eq!(sanitize_name("a\\b"), "a_b");
        assert_eq!(sanitize_name("\u{7}"), "");
    }

    #[test]
    fn msi_detection_is_case_insensitive() {
        assert!(is_msi_file(Path::new("/x/Setup.MSI")));
        assert!(!is_msi_file(Path::new("/x/setup.exe")));
        assert!(!is_msi_file(Path::new("/x/no-extension")));
    }

    #[test]
    fn second_creation_request_is_rejected_while_one_runs() {
        let dir = TempDir::new().unwrap();
        let (mut manager, _) = manager_with_bottle(&dir);
        manager.creating = true;

        let params = NewBottleParams {
            name: "another".to_string(),
            windows: DEFAULT_WINDOWS,
            bit: Bit::Win64,
            audio_driver: DEFAULT_AUDIO_DRIVER,
            virtual_desktop_resolution: None,
            disable_gecko_mono: false,
        };
        assert!(manager.new_bottle(params, |_| {}).is_err());

        manager.creation_finished();
        assert!(!manager.creation_in_progress());
    }

    #[test]
    fn creating_over_an_existing_machine_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (mut manager, _) = manager_with_bottle(&dir);

        let params = NewBottleParams {
            name: "test-bottle".to_string(),
            windows: DEFAULT_WINDOWS,
            bit: Bit::Win64,
            audio_driver: DEFAULT_AUDIO_DRIVER,
            virtual_desktop_resolution: None,
            disable_gecko_mono: false,
        };
        let result = manager.new_bottle(params, |_| {});
        assert!(result.is_err());
        assert!(!manager.creation_in_progress());
    }

    #[test]
    fn every_tool_except_winetricks_is_a_wine_command() {
        assert_eq!(Tool::Console.wine_command(), Some("wineconsole"));
        assert_eq!(Tool::RegistryEditor.wine_command(), Some("regedit"));
        assert_eq!(Tool::WinetricksGui.wine_command(), None);
    }
}
