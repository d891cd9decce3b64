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
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use crate::error::Error;
use crate::platform::Bowtie2Toolchain;

/// Bundled phiX174 control sequence in FASTA format.
const PHIX_FASTA: &str = include_str!("../resources/phix.fasta");

/// Name under which the control sequence is merged into a reference set.
pub const CONTROL_NAME: &str = "phix";

/// A single named reference sequence.
///
/// Names are opaque identifiers and are written verbatim into the staged
/// FASTA file; they do not need to be unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub name: String,
    pub sequence: String,
}

/// Reference sequences supplied either inline or as a FASTA file on disk.
#[derive(Clone, Debug)]
pub enum ReferenceSource {
    Records(Vec<ReferenceRecord>),
    FastaFile(PathBuf),
}

impl ReferenceSource {
    /// Resolves the source into an ordered record list.
    ///
    /// A [ReferenceSource::FastaFile] is parsed with needletail; the full
    /// header line becomes the record name.
    pub fn resolve(&self) -> Result<Vec<ReferenceRecord>, Error> {
        match self {
            ReferenceSource::Records(records) => Ok(records.clone()),
            ReferenceSource::FastaFile(path) => {
                if !path.is_file() {
                    return Err(Error::MissingInput(path.clone()));
                }
                let mut reader = needletail::parse_fastx_file(path)?;
                let mut records: Vec<ReferenceRecord> = Vec::new();
                while let Some(rec) = reader.next() {
                    let rec = rec?;
                    records.push(ReferenceRecord {
                        name: String::from_utf8_lossy(rec.id()).to_string(),
                        sequence: String::from_utf8_lossy(&rec.seq()).to_string(),
                    });
                }
                Ok(records)
            },
        }
    }
}

/// Loads the bundled control sequence.
///
/// Skips the FASTA header line and concatenates the remaining stripped lines
/// into one sequence string named [CONTROL_NAME].
pub fn control_record() -> ReferenceRecord {
    let sequence: String = PHIX_FASTA.lines().skip(1).map(str::trim).collect();
    ReferenceRecord {
        name: CONTROL_NAME.to_string(),
        sequence,
    }
}

/// Writes `records` to `path` as plain FASTA in input order.
///
/// Each record becomes one `>name` line followed by one unwrapped sequence
/// line.
pub fn write_reference_fasta(records: &[ReferenceRecord], path: &Path) -> Result<(), Error> {
    let mut conn_out = BufWriter::new(File::create(path)?);
    for record in records {
        writeln!(conn_out, ">{}", record.name)?;
        writeln!(conn_out, "{}", record.sequence)?;
    }
    conn_out.flush()?;
    Ok(())
}

/// Builds a bowtie2 reference index from `input_fasta`.
///
/// The index files are keyed by the base filename of `index_name` and placed
/// in `index_dir` when one is given (created recursively if absent), or next
/// to the input FASTA otherwise.
///
/// Runs `bowtie2-build <fasta> <index_base> --quiet` as an argument vector.
/// The child's output streams pass through to the console, so a failing
/// build still shows the tool's own error text; a non-zero exit status maps
/// to [Error::IndexBuild], which carries no further diagnostics itself.
///
/// Returns the index base path to pass to bowtie2 as `-x`.
pub fn build_reference(
    toolchain: &Bowtie2Toolchain,
    input_fasta: &Path,
    index_name: &str,
    index_dir: Option<&Path>,
) -> Result<PathBuf, Error> {
    let input_fasta = std::path::absolute(input_fasta)?;
    if !input_fasta.is_file() {
        return Err(Error::MissingInput(input_fasta));
    }

    let base = Path::new(index_name)
        .file_name()
        .unwrap_or_else(|| OsStr::new(index_name));
    let index_base = match index_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.join(base)
        },
        None => input_fasta
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(base),
    };

    let indexer = toolchain.indexer();
    log::debug!(
        "{} {} {} --quiet",
        indexer.display(),
        input_fasta.display(),
        index_base.display()
    );

    // Quiet mode keeps the happy path silent; diagnostics from a failing
    // build still reach the console through the inherited streams.
    let status = Command::new(&indexer)
        .arg(&input_fasta)
        .arg(&index_base)
        .arg("--quiet")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;
    if !status.success() {
        return Err(Error::IndexBuild(status.code().unwrap_or(-1)));
    }

    Ok(index_base)
}
