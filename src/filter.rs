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
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::align::timestamp_token;
use crate::align::AlignRequest;
use crate::align::Bowtie2Opt;
use crate::error::Error;
use crate::platform::Bowtie2Toolchain;
use crate::reference::ReferenceSource;

/// Suffix appended to an input file when its pre-filter content is kept.
pub const BACKUP_SUFFIX: &str = ".before-phix-filter.fastq";

/// Knobs for [remove_phix_sequences].
#[derive(Clone, Copy, Debug)]
pub struct FilterOpts {
    /// Thread count forwarded to bowtie2.
    pub threads: usize,
    /// Rename the filtered files back over the original paths.
    pub restore_original_names: bool,
    /// Delete the throwaway alignment file once the filtered reads exist.
    pub delete_intermediate_alignment: bool,
    /// Delete the original files instead of keeping backups. Implies
    /// `restore_original_names`.
    pub delete_original_files: bool,
}

impl Default for FilterOpts {
    fn default() -> Self {
        Self {
            threads: 2,
            restore_original_names: true,
            delete_intermediate_alignment: true,
            delete_original_files: false,
        }
    }
}

/// Removes read pairs matching the phiX control sequence from paired FASTQ
/// files.
///
/// Aligns the input pairs against the bundled control sequence only, asking
/// bowtie2 to dump pairs that do *not* align to `<result_prefix>.1` and
/// `<result_prefix>.2` via `--un-conc`. The alignment file itself is a
/// throwaway side product.
///
/// When restoring original names each input file is first moved to
/// `<input>.before-phix-filter.fastq` (or deleted outright when
/// `delete_original_files` is set) and the matching filtered file is renamed
/// over the input path; the returned paths are then the input paths. Without
/// restoration the `<result_prefix>.{1,2}` paths are returned and the inputs
/// are left untouched.
///
/// The rename sequence is not rolled back on failure: an error partway
/// through leaves a mix of renamed and original files for the caller to
/// recover manually.
pub fn remove_phix_sequences(
    toolchain: &Bowtie2Toolchain,
    read_files: &[PathBuf],
    result_prefix: &Path,
    opts: &FilterOpts,
) -> Result<Vec<PathBuf>, Error> {
    // Deleting the originals without restoring names would strand the
    // results under the prefix names.
    let restore = opts.restore_original_names || opts.delete_original_files;

    let working_dir = read_files
        .first()
        .and_then(|f| f.parent())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let sam_name = format!("sam_file{}.sam", timestamp_token());

    let request = AlignRequest::new(
        read_files.to_vec(),
        ReferenceSource::Records(Vec::new()),
        true,
        sam_name.as_str(),
    )
    .index_name("phix.ref")
    .working_dir(&working_dir)
    .include_control(true)
    .threads(opts.threads)
    .options(vec![Bowtie2Opt::value(
        "--un-conc",
        result_prefix.to_string_lossy(),
    )]);

    request.run(toolchain)?;

    if opts.delete_intermediate_alignment {
        fs::remove_file(working_dir.join(&sam_name))?;
    }

    let unaligned = [
        PathBuf::from(format!("{}.1", result_prefix.display())),
        PathBuf::from(format!("{}.2", result_prefix.display())),
    ];

    if !restore {
        return Ok(unaligned.to_vec());
    }

    for (original, filtered) in read_files.iter().zip(unaligned.iter()) {
        if opts.delete_original_files {
            fs::remove_file(original)?;
        } else {
            let backup = PathBuf::from(format!("{}{}", original.display(), BACKUP_SUFFIX));
            fs::rename(original, backup)?;
        }
        fs::rename(filtered, original)?;
    }

    Ok(read_files.to_vec())
}
