use crate::error::SetupError;
use std::fmt;

pub const ARM64: &str = "arm64";
pub const ARMV8: &str = "armv8";
pub const AMD64: &str = "amd64";
pub const X64: &str = "x64";
pub const X86_64: &str = "x86_64";
pub const X86: &str = "x86";
pub const I386: &str = "i386";

const LINUX_ARCHS: &[&str] = &[ARM64, ARMV8, AMD64, X64, X86_64];
const WINDOWS_ARCHS: &[&str] = &[AMD64, I386, X86, X64, X86_64];

/// Operating system this binary was built for
pub const DIST_OS: &str = env!("EDGE_SETUP_DIST_OS");
/// Architecture this binary was built for, as reported by rustc
pub const DIST_ARCH: &str = env!("EDGE_SETUP_DIST_ARCH");

/// The device platform the edge agent will be installed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlatform {
    pub os: String,
    pub arch: String,
    pub accelerator: String,
}

impl TargetPlatform {
    /// Build a platform from user input, lower-casing every field.
    pub fn new(os: &str, arch: &str, accelerator: &str) -> Self {
        Self {
            os: os.trim().to_lowercase(),
            arch: arch.trim().to_lowercase(),
            accelerator: accelerator.trim().to_lowercase(),
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        let allowed = match self.os.as_str() {
            "linux" => LINUX_ARCHS,
            "windows" => WINDOWS_ARCHS,
            other => {
                return Err(SetupError::InvalidPlatform(format!(
                    "unsupported os '{}' (expected linux or windows)",
                    other
                )));
            }
        };

        if !allowed.contains(&self.arch.as_str()) {
            return Err(SetupError::InvalidPlatform(format!(
                "invalid architecture '{}' for {} (expected one of: {})",
                self.arch,
                self.os,
                allowed.join(", ")
            )));
        }

        Ok(())
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Target Platform")?;
        writeln!(f, "\tOs: {}", self.os)?;
        writeln!(f, "\tArchitecture: {}", self.arch)?;
        write!(f, "\tAccelerator: {}", self.accelerator)
    }
}

/// Architecture name of the build target in the vocabulary `validate` accepts.
pub fn host_arch() -> &'static str {
    dist_arch_name(DIST_ARCH)
}

fn dist_arch_name(rust_arch: &str) -> &str {
    match rust_arch {
        "aarch64" => ARM64,
        "x86" => X86,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_architectures() {
        for arch in LINUX_ARCHS {
            assert!(TargetPlatform::new("linux", arch, "").validate().is_ok());
        }
        assert!(TargetPlatform::new("linux", "i386", "").validate().is_err());
    }

    #[test]
    fn test_windows_architectures() {
        for arch in WINDOWS_ARCHS {
            assert!(TargetPlatform::new("windows", arch, "").validate().is_ok());
        }
        assert!(TargetPlatform::new("windows", "arm64", "").validate().is_err());
    }

    #[test]
    fn test_unknown_os_rejected() {
        let err = TargetPlatform::new("macos", "arm64", "")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("macos"));
    }

    #[test]
    fn test_input_is_lowercased() {
        let platform = TargetPlatform::new("Linux", "X86_64", "NVIDIA");
        assert_eq!(platform.os, "linux");
        assert_eq!(platform.arch, "x86_64");
        assert_eq!(platform.accelerator, "nvidia");
        assert!(platform.validate().is_ok());
    }

    #[test]
    fn test_dist_arch_mapping() {
        assert_eq!(dist_arch_name("aarch64"), "arm64");
        assert_eq!(dist_arch_name("x86_64"), "x86_64");
        assert_eq!(dist_arch_name("x86"), "x86");
    }
}
