use serde::{Deserialize, Serialize};
use std::fmt;

/// Windows editions a bottle can emulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowsVersion {
    Windows10,
    Windows81,
    Windows8,
    Windows2008R2,
    Windows7,
    Windows2008,
    WindowsVista,
    Windows2003,
    WindowsXP,
    Windows2000,
    WindowsME,
    Windows98,
    Windows95,
    WindowsNT40,
    WindowsNT351,
    Windows31,
    Windows30,
    Windows20,
}

/// Prefix architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bit {
    Win32,
    Win64,
}

/// Wine audio driver backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioDriver {
    PulseAudio,
    Alsa,
    Oss,
    CoreAudio,
    Disabled,
}

/// DLL override load orders as stored in the DllOverrides registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DllLoadOrder {
    Native,
    Builtin,
    NativeBuiltin,
    BuiltinNative,
    Disabled,
}

/// Registry fingerprint of a Windows edition: version number, build number
/// and (for the NT line) product type. Build numbers are decimal.
pub struct WindowsRegistryEntry {
    pub windows: WindowsVersion,
    pub version_number: &'static str,
    pub build_number: &'static str,
    pub product_type: &'static str,
}

// Keep in sync with winecfg's appdefaults table; WindowsXP appears twice
// (64-bit reports the 2003 kernel version).
pub const WINDOWS_REGISTRY_TABLE: &[WindowsRegistryEntry] = &[
    WindowsRegistryEntry { windows: WindowsVersion::Windows10, version_number: "10.0", build_number: "17134", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows81, version_number: "6.3", build_number: "9600", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows8, version_number: "6.2", build_number: "9200", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows2008R2, version_number: "6.1", build_number: "7601", product_type: "ServerNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows7, version_number: "6.1", build_number: "7601", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows2008, version_number: "6.0", build_number: "6002", product_type: "ServerNT" },
    WindowsRegistryEntry { windows: WindowsVersion::WindowsVista, version_number: "6.0", build_number: "6002", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows2003, version_number: "5.2", build_number: "3790", product_type: "ServerNT" },
    WindowsRegistryEntry { windows: WindowsVersion::WindowsXP, version_number: "5.2", build_number: "3790", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::WindowsXP, version_number: "5.1", build_number: "2600", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows2000, version_number: "5.0", build_number: "2195", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::WindowsME, version_number: "4.90", build_number: "3000", product_type: "" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows98, version_number: "4.10", build_number: "2222", product_type: "" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows95, version_number: "4.0", build_number: "950", product_type: "" },
    WindowsRegistryEntry { windows: WindowsVersion::WindowsNT40, version_number: "4.0", build_number: "1381", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::WindowsNT351, version_number: "3.51", build_number: "1057", product_type: "WinNT" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows31, version_number: "3.10", build_number: "0", product_type: "" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows30, version_number: "3.0", build_number: "0", product_type: "" },
    WindowsRegistryEntry { windows: WindowsVersion::Windows20, version_number: "2.0", build_number: "0", product_type: "" },
];

/// Windows/architecture pairs offered by the new bottle assistant
pub const SUPPORTED_WINDOWS_VERSIONS: &[(WindowsVersion, Bit)] = &[
    (WindowsVersion::Windows10, Bit::Win64),
    (WindowsVersion::Windows10, Bit::Win32),
    (WindowsVersion::Windows81, Bit::Win64),
    (WindowsVersion::Windows81, Bit::Win32),
    (WindowsVersion::Windows8, Bit::Win64),
    (WindowsVersion::Windows8, Bit::Win32),
    (WindowsVersion::Windows7, Bit::Win64),
    (WindowsVersion::Windows7, Bit::Win32),
    (WindowsVersion::WindowsVista, Bit::Win64),
    (WindowsVersion::WindowsVista, Bit::Win32),
    (WindowsVersion::WindowsXP, Bit::Win64),
    (WindowsVersion::WindowsXP, Bit::Win32),
    (WindowsVersion::Windows2000, Bit::Win32),
    (WindowsVersion::Windows98, Bit::Win32),
    (WindowsVersion::Windows95, Bit::Win32),
];

pub const AUDIO_DRIVERS: &[AudioDriver] = &[
    AudioDriver::PulseAudio,
    AudioDriver::Alsa,
    AudioDriver::Oss,
    AudioDriver::CoreAudio,
    AudioDriver::Disabled,
];

/// Wine defaults for a freshly booted prefix
pub const DEFAULT_WINDOWS: WindowsVersion = WindowsVersion::Windows7;
pub const DEFAULT_BIT: Bit = Bit::Win64;
pub const DEFAULT_AUDIO_DRIVER: AudioDriver = AudioDriver::PulseAudio;
pub const DEFAULT_VIRTUAL_DESKTOP_RESOLUTION: &str = "960x540";

impl WindowsVersion {
    /// Winetricks verb that switches a prefix to this edition
    pub fn winetricks_verb(self) -> &'static str {
        match self {
            WindowsVersion::Windows10 => "win10",
            WindowsVersion::Windows81 => "win81",
            WindowsVersion::Windows8 => "win8",
            WindowsVersion::Windows2008R2 => "win2008r2",
            WindowsVersion::Windows7 => "win7",
            WindowsVersion::Windows2008 => "win2008",
            WindowsVersion::WindowsVista => "vista",
            WindowsVersion::Windows2003 => "win2003",
            WindowsVersion::WindowsXP => "winxp",
            WindowsVersion::Windows2000 => "win2k",
            WindowsVersion::WindowsME => "winme",
            WindowsVersion::Windows98 => "win98",
            WindowsVersion::Windows95 => "win95",
            WindowsVersion::WindowsNT40 => "nt40",
            WindowsVersion::WindowsNT351 => "nt351",
            WindowsVersion::Windows31 => "win31",
            WindowsVersion::Windows30 => "win30",
            WindowsVersion::Windows20 => "win20",
        }
    }
}

impl fmt::Display for WindowsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowsVersion::Windows10 => "Windows 10",
            WindowsVersion::Windows81 => "Windows 8.1",
            WindowsVersion::Windows8 => "Windows 8",
            WindowsVersion::Windows2008R2 => "Windows 2008 R2",
            WindowsVersion::Windows7 => "Windows 7",
            WindowsVersion::Windows2008 => "Windows 2008",
            WindowsVersion::WindowsVista => "Windows Vista",
            WindowsVersion::Windows2003 => "Windows 2003",
            WindowsVersion::WindowsXP => "Windows XP",
            WindowsVersion::Windows2000 => "Windows 2000",
            WindowsVersion::WindowsME => "Windows ME",
            WindowsVersion::Windows98 => "Windows 98",
            WindowsVersion::Windows95 => "Windows 95",
            WindowsVersion::WindowsNT40 => "Windows NT 4.0",
            WindowsVersion::WindowsNT351 => "Windows NT 3.51",
            WindowsVersion::Windows31 => "Windows 3.1",
            WindowsVersion::Windows30 => "Windows 3.0",
            WindowsVersion::Windows20 => "Windows 2.0",
        };
        write!(f, "{}", name)
    }
}

impl Bit {
    /// Value of the WINEARCH environment variable / #arch registry meta
    pub fn wine_arch(self) -> &'static str {
        match self {
            Bit::Win32 => "win32",
            Bit::Win64 => "win64",
        }
    }

    pub fn from_wine_arch(value: &str) -> Option<Bit> {
        match value {
            "win32" => Some(Bit::Win32),
            "win64" => Some(Bit::Win64),
            _ => None,
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bit::Win32 => write!(f, "32-bit"),
            Bit::Win64 => write!(f, "64-bit"),
        }
    }
}

impl AudioDriver {
    /// Driver name as stored in the registry and passed to winetricks sound=
    pub fn registry_value(self) -> &'static str {
        match self {
            AudioDriver::PulseAudio => "pulse",
            AudioDriver::Alsa => "alsa",
            AudioDriver::Oss => "oss",
            AudioDriver::CoreAudio => "coreaudio",
            AudioDriver::Disabled => "disabled",
        }
    }

    /// Unknown or missing values fall back to PulseAudio, matching Wine
    pub fn from_registry_value(value: &str) -> AudioDriver {
        match value {
            "pulse" => AudioDriver::PulseAudio,
            "alsa" => AudioDriver::Alsa,
            "oss" => AudioDriver::Oss,
            "coreaudio" => AudioDriver::CoreAudio,
            "disabled" => AudioDriver::Disabled,
            _ => AudioDriver::PulseAudio,
        }
    }
}

impl fmt::Display for AudioDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioDriver::PulseAudio => "PulseAudio",
            AudioDriver::Alsa => "ALSA",
            AudioDriver::Oss => "OSS",
            AudioDriver::CoreAudio => "CoreAudio",
            AudioDriver::Disabled => "Disabled",
        };
        write!(f, "{}", name)
    }
}

impl DllLoadOrder {
    pub fn registry_value(self) -> &'static str {
        match self {
            DllLoadOrder::Native => "native",
            DllLoadOrder::Builtin => "builtin",
            DllLoadOrder::NativeBuiltin => "native,builtin",
            DllLoadOrder::BuiltinNative => "builtin,native",
            DllLoadOrder::Disabled => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_table_covers_every_edition() {
        for entry in WINDOWS_REGISTRY_TABLE {
            // Display must not panic and the verb must be non-empty
            assert!(!entry.windows.to_string().is_empty());
            assert!(!entry.windows.winetricks_verb().is_empty());
        }
    }

    #[test]
    fn xp_has_both_architectures_in_the_table() {
        let xp: Vec<_> = WINDOWS_REGISTRY_TABLE
            .iter()
            .filter(|e| e.windows == WindowsVersion::WindowsXP)
            .collect();
        assert_eq!(xp.len(), 2);
        assert!(xp.iter().any(|e| e.version_number == "5.1"));
        assert!(xp.iter().any(|e| e.version_number == "5.2"));
    }

    #[test]
    fn bit_round_trips_through_wine_arch() {
        assert_eq!(Bit::from_wine_arch(Bit::Win32.wine_arch()), Some(Bit::Win32));
        assert_eq!(Bit::from_wine_arch(Bit::Win64.wine_arch()), Some(Bit::Win64));
        assert_eq!(Bit::from_wine_arch("arm64"), None);
    }

    #[test]
    fn unknown_audio_driver_falls_back_to_pulse() {
        assert_eq!(AudioDriver::from_registry_value("jack"), AudioDriver::PulseAudio);
        assert_eq!(AudioDriver::from_registry_value("alsa"), AudioDriver::Alsa);
    }

    #[test]
    fn native_builtin_load_order_string() {
        assert_eq!(DllLoadOrder::NativeBuiltin.registry_value(), "native,builtin");
        assert_eq!(DllLoadOrder::Disabled.registry_value(), "");
    }
}
