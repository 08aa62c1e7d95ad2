use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

const WINETRICKS_URL: &str =
    "https://raw.githubusercontent.com/Winetricks/winetricks/master/src/winetricks";
const USER_AGENT: &str = concat!("Cellar/", env!("CARGO_PKG_VERSION"));

const MIN_DESKTOP_WIDTH: u32 = 640;
const MIN_DESKTOP_HEIGHT: u32 = 480;

/// Installable component packages offered by the settings window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    /// DirectX 9 on OpenGL; optional DLL set version such as "26"
    D3dx9 { version: Option<String> },
    /// Vulkan-based DirectX 9/10/11; None installs the latest release
    Dxvk { version: Option<String> },
    /// Visual C++ redistributable for the given year
    VisualCpp { year: String },
    /// Native .NET; version strings like "40" or "452"
    DotNet { version: String },
    CoreFonts,
    LiberationFonts,
}

impl Package {
    /// The winetricks verb that installs this package
    pub fn verb(&self) -> String {
        match self {
            Package::D3dx9 { version: None } => "d3dx9".to_string(),
            Package::D3dx9 { version: Some(v) } => format!("d3dx9_{}", v),
            Package::Dxvk { version: None } => "dxvk".to_string(),
            Package::Dxvk { version: Some(v) } => format!("dxvk{}", v),
            Package::VisualCpp { year } => format!("vcrun{}", year),
            Package::DotNet { version } => format!("dotnet{}", version),
            Package::CoreFonts => "corefonts".to_string(),
            Package::LiberationFonts => "liberation".to_string(),
        }
    }

    /// .NET installers refuse the unattended flag
    pub fn quiet(&self) -> bool {
        !matches!(self, Package::DotNet { .. })
    }

    /// Text for the busy dialog while the install runs
    pub fn busy_message(&self) -> String {
        match self {
            Package::D3dx9 { .. } => {
                "Installing D3DX9 (OpenGL implementation of DirectX 9).".to_string()
            }
            Package::Dxvk { .. } => {
                "Installing DXVK (Vulkan-based implementation of DirectX 9, 10 and 11).".to_string()
            }
            Package::VisualCpp { year } => format!("Installing Visual C++ {} package.", year),
            Package::DotNet { version } => format!(
                "Installing native .NET redistributable packages (v{}).\nThis may take quite some time...",
                version
            ),
            Package::CoreFonts => "Installing MS Core fonts.".to_string(),
            Package::LiberationFonts => "Installing Liberation open-source fonts.".to_string(),
        }
    }
}

/// Manages the bundled winetricks script used for package installs and
/// prefix configuration.
#[derive(Clone)]
pub struct Winetricks {
    script_path: PathBuf,
    checksum_path: PathBuf,
}

impl Winetricks {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            script_path: data_dir.join("winetricks"),
            checksum_path: data_dir.join("winetricks.sha256"),
        }
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn is_installed(&self) -> bool {
        self.script_path.is_file()
    }

    /// Download the winetricks script into the data directory.
    pub fn install(&self) -> Result<()> {
        let parent = self
            .script_path
            .parent()
            .context("Winetricks path has no parent directory")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;

        info!(url = WINETRICKS_URL, "downloading winetricks");
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        let response = client
            .get(WINETRICKS_URL)
            .send()
            .context("Could not download winetricks")?;
        if !response.status().is_success() {
            anyhow::bail!("Winetricks download failed with status {}", response.status());
        }
        let bytes = response.bytes()?;

        // Write next to the final location, then move it in place
        let staging = self.script_path.with_extension("part");
        fs::write(&staging, &bytes)
            .with_context(|| format!("Could not write {}", staging.display()))?;
        let mut perms = fs::metadata(&staging)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&staging, perms)?;
        fs::rename(&staging, &self.script_path)?;

        let checksum = sha256_of(&self.script_path)?;
        fs::write(&self.checksum_path, &checksum)?;
        info!(%checksum, "winetricks installed");
        Ok(())
    }

    /// Run `winetricks --self-update` and record whether the script changed.
    pub fn self_update(&self) -> Result<()> {
        if !self.is_installed() {
            anyhow::bail!("Tried to update winetricks while it is not installed");
        }

        let status = Command::new(&self.script_path)
            .arg("--self-update")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("Could not run winetricks --self-update")?;
        if !status.success() {
            anyhow::bail!(
                "Could not update winetricks, keep using v{}",
                self.version().unwrap_or_else(|_| "unknown".to_string())
            );
        }

        let checksum = sha256_of(&self.script_path)?;
        let previous = fs::read_to_string(&self.checksum_path).unwrap_or_default();
        if previous.trim() == checksum {
            debug!("winetricks already up to date");
        } else {
            info!(%checksum, "winetricks script updated");
            fs::write(&self.checksum_path, &checksum)?;
        }
        Ok(())
    }

    /// Winetricks version, the leading YYYYMMDD of `--version` output
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.script_path)
            .arg("--version")
            .output()
            .context("Could not run winetricks --version")?;
        parse_version_output(&String::from_utf8_lossy(&output.stdout))
    }

    /// Arguments for installing a package (adds -q where supported)
    pub fn install_args(package: &Package) -> Vec<OsString> {
        let mut args = Vec::new();
        if package.quiet() {
            args.push(OsString::from("-q"));
        }
        args.push(OsString::from(package.verb()));
        args
    }

    /// Run a winetricks verb against a prefix and wait for it.
    fn run_verb(&self, prefix: &Path, verb: &str, check_status: bool) -> Result<()> {
        let output = Command::new(&self.script_path)
            .arg(verb)
            .env("WINEPREFIX", prefix)
            .stdout(Stdio::null())
            .output()
            .with_context(|| format!("Could not run winetricks {}", verb))?;
        // Some winetricks verbs (vd=...) report non-zero even on success,
        // in which case the caller opts out of the status check.
        if check_status && !output.status.success() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr),
                "winetricks verb failed"
            );
            anyhow::bail!("winetricks {} failed", verb);
        }
        Ok(())
    }

    pub fn set_windows_version(
        &self,
        prefix: &Path,
        windows: crate::core::types::WindowsVersion,
    ) -> Result<()> {
        self.run_verb(prefix, windows.winetricks_verb(), true)
            .context("Could not set the Windows version")
    }

    pub fn set_virtual_desktop(&self, prefix: &Path, resolution: &str) -> Result<()> {
        let resolution = normalize_resolution(resolution)?;
        self.run_verb(prefix, &format!("vd={}", resolution), false)
    }

    pub fn disable_virtual_desktop(&self, prefix: &Path) -> Result<()> {
        self.run_verb(prefix, "vd=off", false)
    }

    pub fn set_audio_driver(
        &self,
        prefix: &Path,
        driver: crate::core::types::AudioDriver,
    ) -> Result<()> {
        self.run_verb(prefix, &format!("sound={}", driver.registry_value()), true)
            .context("Could not set the audio driver")
    }
}

/// Clamp a WxH resolution string to the minimum Wine supports.
fn normalize_resolution(resolution: &str) -> Result<String> {
    let (width, height) = resolution
        .split_once('x')
        .context("Invalid virtual desktop resolution")?;
    let width: u32 = width
        .trim()
        .parse()
        .context("Invalid virtual desktop width")?;
    let height: u32 = height
        .trim()
        .parse()
        .context("Invalid virtual desktop height")?;

    if width < MIN_DESKTOP_WIDTH || height < MIN_DESKTOP_HEIGHT {
        Ok(format!("{}x{}", MIN_DESKTOP_WIDTH, MIN_DESKTOP_HEIGHT))
    } else {
        Ok(format!("{}x{}", width, height))
    }
}

fn parse_version_output(output: &str) -> Result<String> {
    let trimmed = output.trim();
    if trimmed.len() < 8 || !trimmed.chars().take(8).all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Unexpected winetricks version output: {}", trimmed);
    }
    Ok(trimmed[..8].to_string())
}

/// SHA-256 of a file, hex encoded
fn sha256_of(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_verbs() {
        assert_eq!(Package::D3dx9 { version: None }.verb(), "d3dx9");
        assert_eq!(
            Package::D3dx9 { version: Some("26".into()) }.verb(),
            "d3dx9_26"
        );
        assert_eq!(Package::Dxvk { version: None }.verb(), "dxvk");
        assert_eq!(Package::Dxvk { version: Some("151".into()) }.verb(), "dxvk151");
        assert_eq!(Package::VisualCpp { year: "2013".into() }.verb(), "vcrun2013");
        assert_eq!(Package::DotNet { version: "452".into() }.verb(), "dotnet452");
        assert_eq!(Package::CoreFonts.verb(), "corefonts");
        assert_eq!(Package::LiberationFonts.verb(), "liberation");
    }

    #[test]
    fn dotnet_installs_are_not_quiet() {
        let dotnet = Package::DotNet { version: "40".into() };
        assert!(!dotnet.quiet());
        assert_eq!(Winetricks::install_args(&dotnet), vec![OsString::from("dotnet40")]);

        let dxvk = Package::Dxvk { version: None };
        assert!(dxvk.quiet());
        assert_eq!(
            Winetricks::install_args(&dxvk),
            vec![OsString::from("-q"), OsString::from("dxvk")]
        );
    }

    #[test]
    fn resolution_is_clamped_to_minimum() {
        assert_eq!(normalize_resolution("320x200").unwrap(), "640x480");
        assert_eq!(normalize_resolution("1920x1080").unwrap(), "1920x1080");
        assert_eq!(normalize_resolution("960 x 540").unwrap(), "960x540");
        assert!(normalize_resolution("garbage").is_err());
        assert!(normalize_resolution("1920").is_err());
    }

    #[test]
    fn winetricks_version_is_the_leading_date() {
        assert_eq!(
            parse_version_output("20240105 - sha256sum ...\n").unwrap(),
            "20240105"
        );
        assert!(parse_version_output("").is_err());
        assert!(parse_version_output("dev").is_err());
    }

    #[test]
    fn sha256_matches_known_digest() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("data");
        std::fs::write(&file, b"abc").unwrap();
        assert_eq!(
            sha256_of(&file).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
