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

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Build a bowtie2 reference index from a FASTA file
    Build {
        #[arg(required = true, help = "Input reference FASTA file")]
        input_fasta: PathBuf,

        #[arg(short = 'n', long = "name", required = true, help = "Base name for the index files")]
        index_name: String,

        #[arg(short = 'o', long = "out-dir", required = false, help = "Directory for the index files, defaults to next to the input")]
        index_dir: Option<PathBuf>,

        // Directory holding the bundled bowtie2 binary variants
        #[arg(long = "bowtie2-dir", default_value = "executables")]
        bowtie2_dir: PathBuf,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Align FASTQ reads against reference sequences
    Align {
        #[arg(group = "input", required = true, help = "Input FASTQ file(s)")]
        read_files: Vec<PathBuf>,

        #[arg(short = 'r', long = "reference", required = true, help = "Reference FASTA file")]
        reference: PathBuf,

        #[arg(short = 'o', long = "output", required = true, help = "Name of the SAM file to generate")]
        output: String,

        #[arg(long = "paired", default_value_t = false, help = "Treat the inputs as an R1/R2 pair")]
        paired: bool,

        #[arg(long = "index-name", required = false, help = "Base name for the reference index, defaults to a timestamp")]
        index_name: Option<String>,

        #[arg(long = "working-dir", required = false, help = "Output directory, defaults to the parent of the first input")]
        working_dir: Option<PathBuf>,

        #[arg(long = "no-control", default_value_t = false, help = "Do not merge the phiX control sequence into the references")]
        no_control: bool,

        #[arg(short = 't', long = "threads", default_value_t = 2)]
        threads: usize,

        #[arg(long = "opt", help = "Extra bowtie2 option as NAME or NAME=VALUE, repeatable")]
        options: Vec<String>,

        // Directory holding the bundled bowtie2 binary variants
        #[arg(long = "bowtie2-dir", default_value = "executables")]
        bowtie2_dir: PathBuf,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Remove phiX control read pairs from paired FASTQ files
    FilterPhix {
        #[arg(group = "input", required = true, num_args = 2, help = "Paired input FASTQ files (read 1, read 2)")]
        read_files: Vec<PathBuf>,

        #[arg(short = 'p', long = "prefix", required = true, help = "Prefix for the filtered read files")]
        result_prefix: PathBuf,

        #[arg(short = 't', long = "threads", default_value_t = 2)]
        threads: usize,

        #[arg(long = "keep-sam", default_value_t = false, help = "Keep the intermediate alignment file")]
        keep_sam: bool,

        #[arg(long = "no-restore", default_value_t = false, help = "Leave the results under the prefix names instead of the input names")]
        no_restore: bool,

        #[arg(long = "delete-originals", default_value_t = false, help = "Delete the input files instead of keeping backups")]
        delete_originals: bool,

        // Directory holding the bundled bowtie2 binary variants
        #[arg(long = "bowtie2-dir", default_value = "executables")]
        bowtie2_dir: PathBuf,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
