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

//! readsift is a library and a command-line client for:
//!
//!   - Building bowtie2 reference indexes from FASTA files.
//!   - Running bowtie2 alignments of single or paired FASTQ reads with
//!     free-form option passthrough.
//!   - Filtering phiX control read pairs out of paired FASTQ files using
//!     bowtie2's unaligned-read dump.
//!
//! The alignment itself is delegated entirely to the external bowtie2
//! binaries; this crate handles locating the right binary variant for the
//! platform, staging reference sequences, constructing command lines,
//! running the child processes, and classifying their failures.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The readsift CLI supports the following subcommands:
//!   - `readsift build` build a reference index from a FASTA file.
//!   - `readsift align` align FASTQ reads against reference sequences.
//!   - `readsift filter-phix` remove phiX control read pairs from paired
//!     FASTQ files.
//!
//! ### Rust API
//!
//! Resolve a [Bowtie2Toolchain] once during initialization, then pass it to
//! [build_reference], [AlignRequest::run], or [remove_phix_sequences]. Every
//! call spawns one child process and blocks until it exits; there is no
//! internal retry, timeout, or cross-call locking, so concurrent callers
//! need disjoint working directories and output names.
//!
//! See [AlignRequest] for a full alignment example.

pub mod align;
pub mod error;
pub mod filter;
pub mod platform;
pub mod reference;

pub use align::align;
pub use align::AlignRequest;
pub use align::Bowtie2Opt;
pub use error::Error;
pub use filter::remove_phix_sequences;
pub use filter::FilterOpts;
pub use platform::Bowtie2Toolchain;
pub use reference::build_reference;
pub use reference::control_record;
pub use reference::write_reference_fasta;
pub use reference::ReferenceRecord;
pub use reference::ReferenceSource;
