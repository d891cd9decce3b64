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
use clap::Parser;

use readsift::AlignRequest;
use readsift::Bowtie2Opt;
use readsift::Bowtie2Toolchain;
use readsift::FilterOpts;
use readsift::ReferenceSource;

mod cli;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()
    .unwrap();
}

fn unwrap_or_exit<T>(res: Result<T, readsift::Error>) -> T {
    res.unwrap_or_else(|err| {
        log::error!("{}", err);
        std::process::exit(1);
    })
}

/// Parses a `--opt` argument: `NAME=VALUE` becomes a flag/value pair,
/// anything else a bare flag.
fn parse_opt(raw: &str) -> Bowtie2Opt {
    match raw.split_once('=') {
        Some((name, value)) => Bowtie2Opt::value(name, value),
        None => Bowtie2Opt::flag(raw),
    }
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    match &cli.command {
        // Build a reference index
        Some(cli::Commands::Build {
            input_fasta,
            index_name,
            index_dir,
            bowtie2_dir,
            verbose,
        }) => {
            init_log(if *verbose { 3 } else { 2 });

            let toolchain = unwrap_or_exit(Bowtie2Toolchain::resolve(bowtie2_dir));
            let index = unwrap_or_exit(readsift::build_reference(
                &toolchain,
                input_fasta,
                index_name,
                index_dir.as_deref(),
            ));
            println!("{}", index.display());
        },

        // Align reads
        Some(cli::Commands::Align {
            read_files,
            reference,
            output,
            paired,
            index_name,
            working_dir,
            no_control,
            threads,
            options,
            bowtie2_dir,
            verbose,
        }) => {
            init_log(if *verbose { 3 } else { 2 });

            let toolchain = unwrap_or_exit(Bowtie2Toolchain::resolve(bowtie2_dir));

            let mut request = AlignRequest::new(
                read_files.clone(),
                ReferenceSource::FastaFile(reference.clone()),
                *paired,
                output.as_str(),
            )
            .include_control(!no_control)
            .threads(*threads)
            .options(options.iter().map(|raw| parse_opt(raw)).collect());
            if let Some(name) = index_name {
                request = request.index_name(name.as_str());
            }
            if let Some(dir) = working_dir {
                request = request.working_dir(dir);
            }

            let sam = unwrap_or_exit(request.run(&toolchain));
            println!("{}", sam.display());
        },

        // Filter phiX control reads
        Some(cli::Commands::FilterPhix {
            read_files,
            result_prefix,
            threads,
            keep_sam,
            no_restore,
            delete_originals,
            bowtie2_dir,
            verbose,
        }) => {
            init_log(if *verbose { 3 } else { 2 });

            let toolchain = unwrap_or_exit(Bowtie2Toolchain::resolve(bowtie2_dir));
            let opts = FilterOpts {
                threads: *threads,
                restore_original_names: !no_restore,
                delete_intermediate_alignment: !keep_sam,
                delete_original_files: *delete_originals,
            };

            let results = unwrap_or_exit(readsift::remove_phix_sequences(
                &toolchain,
                read_files,
                result_prefix,
                &opts,
            ));
            for path in results {
                println!("{}", path.display());
            }
        },

        None => {
            use clap::CommandFactory;
            cli::Cli::command().print_help().unwrap();
        },
    }
}
