// readsift: Bowtie2 orchestration and phiX control read filtering.
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::path::Path;
use std::path::PathBuf;

use crate::error::Error;

/// Paths to the bowtie2 executables for the running operating system.
///
/// Resolved once during initialization and passed to the functions that spawn
/// the external processes. Resolution only decides which bundled binary
/// variant to use; the executables themselves are not probed until they are
/// run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bowtie2Toolchain {
    variant_dir: PathBuf,
    exe_suffix: &'static str,
}

impl Bowtie2Toolchain {
    /// Resolves the toolchain under `executables_dir` for the operating
    /// system this process is running on.
    pub fn resolve(executables_dir: &Path) -> Result<Self, Error> {
        Self::for_os(executables_dir, std::env::consts::OS)
    }

    /// Resolves the toolchain for an explicit OS identity string as found in
    /// `std::env::consts::OS`.
    pub fn for_os(executables_dir: &Path, os: &str) -> Result<Self, Error> {
        let (variant, exe_suffix) = match os {
            "linux" | "freebsd" | "netbsd" | "openbsd" => ("bowtie2-2.2.8-linux", ""),
            "windows" => ("bowtie2-2.2.8-windows", ".exe"),
            // recognized, but no binary variant is bundled for it
            "macos" => return Err(Error::UnsupportedPlatform(os.to_string())),
            other => return Err(Error::UnsupportedPlatform(other.to_string())),
        };
        Ok(Self {
            variant_dir: executables_dir.join(variant),
            exe_suffix,
        })
    }

    /// Path to the `bowtie2` aligner executable.
    pub fn aligner(&self) -> PathBuf {
        self.variant_dir.join(format!("bowtie2{}", self.exe_suffix))
    }

    /// Path to the `bowtie2-build` indexer executable.
    pub fn indexer(&self) -> PathBuf {
        self.variant_dir.join(format!("bowtie2-build{}", self.exe_suffix))
    }
}
