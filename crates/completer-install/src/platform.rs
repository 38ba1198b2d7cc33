//! Architecture and platform mapping for published engine builds
//!
//! Builds are published per `<arch>-<platformSuffix>` directory, e.g.
//! `x86_64-unknown-linux-musl` or `aarch64-apple-darwin`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InstallError, Result};

/// CPU architecture of a published build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    I686,
    X86_64,
    Aarch64,
}

impl Arch {
    /// Map a Rust `target_arch` name (`std::env::consts::ARCH`)
    pub fn from_rust_arch(arch: &str) -> Result<Self> {
        match arch {
            "x86" => Ok(Arch::I686),
            "x86_64" => Ok(Arch::X86_64),
            "aarch64" => Ok(Arch::Aarch64),
            other => Err(InstallError::UnsupportedArchitecture(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::I686 => "i686",
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
        }
    }
}

/// Operating system family of a published build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    WindowsGnu,
    AppleDarwin,
    LinuxMusl,
}

impl Platform {
    /// Map a Rust `target_os` name (`std::env::consts::OS`).
    /// The BSDs run the static musl Linux build.
    pub fn from_rust_os(os: &str) -> Result<Self> {
        match os {
            "windows" => Ok(Platform::WindowsGnu),
            "macos" => Ok(Platform::AppleDarwin),
            "linux" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" => Ok(Platform::LinuxMusl),
            other => Err(InstallError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Platform::WindowsGnu => "pc-windows-gnu",
            Platform::AppleDarwin => "apple-darwin",
            Platform::LinuxMusl => "unknown-linux-musl",
        }
    }

    /// File extension appended to executables
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::WindowsGnu => ".exe",
            _ => "",
        }
    }
}

/// The `<arch>-<platformSuffix>` pair naming a build directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetTriple {
    pub arch: Arch,
    pub platform: Platform,
}

impl TargetTriple {
    pub fn new(arch: Arch, platform: Platform) -> Self {
        Self { arch, platform }
    }

    /// Triple for the running process
    pub fn detect() -> Result<Self> {
        Self::from_rust(std::env::consts::ARCH, std::env::consts::OS)
    }

    /// Triple from Rust arch/os names
    pub fn from_rust(arch: &str, os: &str) -> Result<Self> {
        Ok(Self {
            arch: Arch::from_rust_arch(arch)?,
            platform: Platform::from_rust_os(os)?,
        })
    }

    /// Platform-specific file name for an executable base name
    pub fn executable(&self, base: &str) -> String {
        format!("{}{}", base, self.platform.exe_suffix())
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch.as_str(), self.platform.suffix())
    }
}
