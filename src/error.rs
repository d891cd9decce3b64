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
use std::path::PathBuf;

use thiserror::Error;

/// Errors from orchestrating the bowtie2 executables.
///
/// All variants are terminal for the call that produced them; nothing in this
/// crate retries.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No bowtie2 binary variant is bundled for the running operating system.
    #[error("unsupported operating system: {0}")]
    UnsupportedPlatform(String),

    /// A required input FASTA file does not exist.
    #[error("input FASTA file does not exist: {0}")]
    MissingInput(PathBuf),

    /// bowtie2-build exited with a non-zero status. The indexer runs in
    /// quiet mode so no diagnostic output is captured.
    #[error("bowtie2-build exited with status {0}")]
    IndexBuild(i32),

    /// bowtie2 itself exited with a non-zero status.
    #[error("bowtie2 exited with status {code}: {stderr}")]
    AlignmentExecution { code: i32, stderr: String },

    /// bowtie2 exited cleanly but never wrote the requested alignment file.
    /// Usually a bad option combination rather than a tool crash, which is
    /// why this is kept distinct from [Error::AlignmentExecution].
    #[error("bowtie2 reported success but {0} was not created, check the supplied options")]
    AlignmentOutputMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fasta(#[from] needletail::errors::ParseError),
}
