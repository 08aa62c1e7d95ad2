use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::core::types::{
    AudioDriver, Bit, DllLoadOrder, WindowsVersion, WINDOWS_REGISTRY_TABLE,
};

pub const SYSTEM_REG: &str = "system.reg";
pub const USER_REG: &str = "user.reg";

// Registry keys as they appear in the reg files (backslashes are doubled on disk)
const KEY_NT_VERSION: &str = r"[Software\\Microsoft\\Windows NT\\CurrentVersion]";
const KEY_9X_VERSION: &str = r"[Software\\Microsoft\\Windows\\CurrentVersion]";
const KEY_PRODUCT_TYPE: &str = r"[System\\CurrentControlSet\\Control\\ProductOptions]";
const KEY_DLL_OVERRIDES: &str = r"[Software\\Wine\\DllOverrides]";
const KEY_AUDIO_DRIVERS: &str = r"[Software\\Wine\\Drivers]";
const KEY_VIRTUAL_DESKTOPS: &str = r"[Software\\Wine\\Explorer\\Desktops]";
const KEY_UNINSTALL: &str = r"[Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\";
const KEY_FONTS_32: &str = r"[Software\\Microsoft\\Windows\\CurrentVersion\\Fonts]";
const KEY_FONTS_64: &str = r"[Software\\Wow6432Node\\Microsoft\\Windows\\CurrentVersion\\Fonts]";

/// Look up a value in a Wine registry file.
///
/// Scans for the first line containing `key`, then searches the lines of
/// that section (up to the next blank line or section header) for
/// `"name"=`. Returns the unquoted data, or `None` when the key or value
/// is absent.
fn read_reg_value(file: &Path, key: &str, name: &str) -> Result<Option<String>> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Could not open registry file {}", file.display()))?;

    let value_pattern = format!("\"{}\"=", name);
    let mut in_section = false;
    for line in content.lines() {
        if !in_section {
            if line.contains(key) {
                in_section = true;
            }
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('[') {
            // End of the section, value not present
            return Ok(None);
        }
        if let Some(rest) = trimmed.strip_prefix(&value_pattern) {
            return Ok(Some(unquote(rest)));
        }
    }
    Ok(None)
}

/// Look up a `#name=value` meta line (e.g. `#arch=win64`) in a registry file.
fn read_reg_meta(file: &Path, name: &str) -> Result<Option<String>> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Could not open registry file {}", file.display()))?;

    let pattern = format!("#{}=", name);
    for line in content.lines() {
        if let Some(idx) = line.find(&pattern) {
            let value = &line[idx + pattern.len()..];
            return Ok(Some(unquote(value)));
        }
    }
    Ok(None)
}

fn unquote(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

/// Determine the Windows edition of a prefix from its system registry.
///
/// NT editions are matched on version + build number (+ product type for
/// the server variants); the 9x line encodes everything in VersionNumber.
pub fn windows_version(prefix: &Path) -> Result<WindowsVersion> {
    let system_reg = prefix.join(SYSTEM_REG);

    if let Some(version) = read_reg_value(&system_reg, KEY_NT_VERSION, "CurrentVersion")? {
        let build = read_reg_value(&system_reg, KEY_NT_VERSION, "CurrentBuildNumber")?
            .unwrap_or_default();
        let product_type =
            read_reg_value(&system_reg, KEY_PRODUCT_TYPE, "ProductType")?.unwrap_or_default();

        for entry in WINDOWS_REGISTRY_TABLE {
            if entry.version_number == version && entry.build_number == build {
                if product_type.is_empty() || entry.product_type == product_type {
                    return Ok(entry.windows);
                }
            }
        }
    } else if let Some(version) = read_reg_value(&system_reg, KEY_9X_VERSION, "VersionNumber")? {
        let mut parts = version.split('.');
        let major = parts.next().unwrap_or_default();
        let minor = parts.next().unwrap_or_default();
        let build = parts.next().unwrap_or_default();
        let major_minor = format!("{}.{}", major, minor);

        for entry in WINDOWS_REGISTRY_TABLE {
            if entry.version_number == major_minor && entry.build_number == build {
                return Ok(entry.windows);
            }
        }
    }

    anyhow::bail!(
        "Could not determine the Windows version of prefix {}",
        prefix.display()
    )
}

/// Determine the prefix architecture from the `#arch` meta of user.reg.
pub fn system_bit(prefix: &Path) -> Result<Bit> {
    let user_reg = prefix.join(USER_REG);
    let arch = read_reg_meta(&user_reg, "arch")?
        .with_context(|| format!("No architecture recorded in prefix {}", prefix.display()))?;
    Bit::from_wine_arch(&arch).with_context(|| {
        format!(
            "Unrecognized architecture '{}' in prefix {}",
            arch,
            prefix.display()
        )
    })
}

/// Audio driver configured for the prefix. Wine treats a missing value as
/// PulseAudio, and so do we.
pub fn audio_driver(prefix: &Path) -> AudioDriver {
    let user_reg = prefix.join(USER_REG);
    match read_reg_value(&user_reg, KEY_AUDIO_DRIVERS, "Audio") {
        Ok(Some(value)) => AudioDriver::from_registry_value(&value),
        _ => AudioDriver::PulseAudio,
    }
}

/// Virtual desktop resolution, or `None` when the virtual desktop is off.
pub fn virtual_desktop(prefix: &Path) -> Option<String> {
    let user_reg = prefix.join(USER_REG);
    read_reg_value(&user_reg, KEY_VIRTUAL_DESKTOPS, "Default")
        .ok()
        .flatten()
}

/// Check whether a DLL override is present with the given load order.
pub fn dll_override(prefix: &Path, dll_name: &str, load_order: DllLoadOrder) -> bool {
    let user_reg = prefix.join(USER_REG);
    match read_reg_value(&user_reg, KEY_DLL_OVERRIDES, dll_name) {
        Ok(Some(value)) => value == load_order.registry_value(),
        _ => false,
    }
}

/// Display name of an uninstaller entry (GUID or application key), if any.
pub fn uninstaller_display_name(prefix: &Path, uninstaller_key: &str) -> Option<String> {
    let system_reg = prefix.join(SYSTEM_REG);
    let key = format!("{}{}", KEY_UNINSTALL, uninstaller_key);
    read_reg_value(&system_reg, &key, "DisplayName")
        .ok()
        .flatten()
}

/// Registered filename of an installed font, if any.
pub fn font_filename(prefix: &Path, bit: Bit, font_name: &str) -> Option<String> {
    let system_reg = prefix.join(SYSTEM_REG);
    let key = match bit {
        Bit::Win32 => KEY_FONTS_32,
        Bit::Win64 => KEY_FONTS_64,
    };
    read_reg_value(&system_reg, key, font_name).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prefix(system_reg: &str, user_reg: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SYSTEM_REG), system_reg).unwrap();
        fs::write(dir.path().join(USER_REG), user_reg).unwrap();
        dir
    }

    const WIN10_SYSTEM_REG: &str = "\
WINE REGISTRY Version 2\n\
;; All keys relative to \\\\Machine\n\
\n\
[Software\\\\Microsoft\\\\Windows NT\\\\CurrentVersion] 1603487380\n\
\"CurrentBuildNumber\"=\"17134\"\n\
\"CurrentVersion\"=\"10.0\"\n\
\n\
[System\\\\CurrentControlSet\\\\Control\\\\ProductOptions] 1603487380\n\
\"ProductType\"=\"WinNT\"\n\
\n\
[Software\\\\Microsoft\\\\Windows\\\\CurrentVersion\\\\Uninstall\\\\{92FB6C44-E685-45AD-9B20-CADF4CABA132}] 1603487390\n\
\"DisplayName\"=\"Microsoft .NET Framework 4.5.2\"\n\
\n\
[Software\\\\Wow6432Node\\\\Microsoft\\\\Windows\\\\CurrentVersion\\\\Fonts] 1603487395\n\
\"Comic Sans MS (TrueType)\"=\"comic.ttf\"\n";

    const WIN64_USER_REG: &str = "\
WINE REGISTRY Version 2\n\
#arch=win64\n\
\n\
[Software\\\\Wine\\\\DllOverrides] 1603487385\n\
\"*dxgi\"=\"native\"\n\
\"*mscoree\"=\"native\"\n\
\"*msvcp120\"=\"native,builtin\"\n\
\n\
[Software\\\\Wine\\\\Drivers] 1603487385\n\
\"Audio\"=\"alsa\"\n\
\n\
[Software\\\\Wine\\\\Explorer\\\\Desktops] 1603487385\n\
\"Default\"=\"1920x1080\"\n";

    #[test]
    fn decodes_nt_windows_version() {
        let prefix = write_prefix(WIN10_SYSTEM_REG, WIN64_USER_REG);
        assert_eq!(
            windows_version(prefix.path()).unwrap(),
            WindowsVersion::Windows10
        );
    }

    #[test]
    fn decodes_9x_windows_version() {
        let system_reg = "\
[Software\\\\Microsoft\\\\Windows\\\\CurrentVersion] 1603487380\n\
\"VersionNumber\"=\"4.10.2222\"\n";
        let prefix = write_prefix(system_reg, WIN64_USER_REG);
        assert_eq!(
            windows_version(prefix.path()).unwrap(),
            WindowsVersion::Windows98
        );
    }

    #[test]
    fn product_type_separates_server_from_desktop() {
        let server_reg = "\
[Software\\\\Microsoft\\\\Windows NT\\\\CurrentVersion] 1\n\
\"CurrentBuildNumber\"=\"7601\"\n\
\"CurrentVersion\"=\"6.1\"\n\
\n\
[System\\\\CurrentControlSet\\\\Control\\\\ProductOptions] 1\n\
\"ProductType\"=\"ServerNT\"\n";
        let prefix = write_prefix(server_reg, WIN64_USER_REG);
        assert_eq!(
            windows_version(prefix.path()).unwrap(),
            WindowsVersion::Windows2008R2
        );
    }

    #[test]
    fn unknown_version_is_an_error() {
        let prefix = write_prefix("[Some\\\\Other\\\\Key] 1\n\"Foo\"=\"bar\"\n", WIN64_USER_REG);
        assert!(windows_version(prefix.path()).is_err());
    }

    #[test]
    fn reads_architecture_meta() {
        let prefix = write_prefix(WIN10_SYSTEM_REG, WIN64_USER_REG);
        assert_eq!(system_bit(prefix.path()).unwrap(), Bit::Win64);
    }

    #[test]
    fn value_lookup_stops_at_section_end() {
        // "Audio" exists only in the Drivers section; a lookup in the
        // DllOverrides section must not leak into the next section.
        let prefix = write_prefix(WIN10_SYSTEM_REG, WIN64_USER_REG);
        let user_reg = prefix.path().join(USER_REG);
        assert_eq!(
            read_reg_value(&user_reg, KEY_DLL_OVERRIDES, "Audio").unwrap(),
            None
        );
    }

    #[test]
    fn audio_driver_defaults_to_pulse_when_unset() {
        let prefix = write_prefix(WIN10_SYSTEM_REG, "WINE REGISTRY Version 2\n#arch=win64\n");
        assert_eq!(audio_driver(prefix.path()), AudioDriver::PulseAudio);

        let prefix = write_prefix(WIN10_SYSTEM_REG, WIN64_USER_REG);
        assert_eq!(audio_driver(prefix.path()), AudioDriver::Alsa);
    }

    #[test]
    fn virtual_desktop_resolution() {
        let prefix = write_prefix(WIN10_SYSTEM_REG, WIN64_USER_REG);
        assert_eq!(
            virtual_desktop(prefix.path()),
            Some("1920x1080".to_string())
        );

        let prefix = write_prefix(WIN10_SYSTEM_REG, "WINE REGISTRY Version 2\n#arch=win64\n");
        assert_eq!(virtual_desktop(prefix.path()), None);
    }

    #[test]
    fn dll_override_matches_exact_load_order() {
        let prefix = write_prefix(WIN10_SYSTEM_REG, WIN64_USER_REG);
        assert!(dll_override(prefix.path(), "*dxgi", DllLoadOrder::Native));
        assert!(dll_override(
            prefix.path(),
            "*msvcp120",
            DllLoadOrder::NativeBuiltin
        ));
        assert!(!dll_override(prefix.path(), "*dxgi", DllLoadOrder::Builtin));
        assert!(!dll_override(prefix.path(), "*d3dx9_43", DllLoadOrder::Native));
    }

    #[test]
    fn uninstaller_and_font_lookups() {
        let prefix = write_prefix(WIN10_SYSTEM_REG, WIN64_USER_REG);
        assert_eq!(
            uninstaller_display_name(prefix.path(), "{92FB6C44-E685-45AD-9B20-CADF4CABA132}"),
            Some("Microsoft .NET Framework 4.5.2".to_string())
        );
        assert_eq!(
            font_filename(prefix.path(), Bit::Win64, "Comic Sans MS (TrueType)"),
            Some("comic.ttf".to_string())
        );
        assert_eq!(
            font_filename(prefix.path(), Bit::Win32, "Comic Sans MS (TrueType)"),
            None
        );
    }
}
