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
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::error::Error;
use crate::platform::Bowtie2Toolchain;
use crate::reference;
use crate::reference::ReferenceSource;

/// One bowtie2 command line option.
///
/// Renders deterministically into argument vector slots: a [Bowtie2Opt::Flag]
/// takes one slot, a [Bowtie2Opt::FlagValue] takes two unless its value is
/// empty, in which case only the flag is emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bowtie2Opt {
    Flag(String),
    FlagValue(String, String),
}

impl Bowtie2Opt {
    /// A bare flag such as `--local`.
    pub fn flag(name: impl Into<String>) -> Self {
        Bowtie2Opt::Flag(name.into())
    }

    /// A flag with a value such as `--np 5`.
    pub fn value(name: impl Into<String>, value: impl ToString) -> Self {
        Bowtie2Opt::FlagValue(name.into(), value.to_string())
    }

    fn render(&self, args: &mut Vec<String>) {
        match self {
            Bowtie2Opt::Flag(name) => args.push(name.clone()),
            Bowtie2Opt::FlagValue(name, value) => {
                args.push(name.clone());
                if !value.is_empty() {
                    args.push(value.clone());
                }
            },
        }
    }
}

/// A single bowtie2 invocation.
///
/// Bundles the input read files, the reference sequences to align against,
/// and everything that goes into the constructed command line. Defaults
/// follow bowtie2 conventions: two threads, control sequence included, no
/// extra options.
///
/// ## Usage
///
/// ```no_run
/// use std::path::Path;
/// use readsift::{AlignRequest, Bowtie2Opt, Bowtie2Toolchain, ReferenceSource};
///
/// let toolchain = Bowtie2Toolchain::resolve(Path::new("executables")).unwrap();
/// let request = AlignRequest::new(
///     vec!["sample_r1.fastq".into(), "sample_r2.fastq".into()],
///     ReferenceSource::FastaFile("barcodes.fasta".into()),
///     true,
///     "sample.sam",
/// )
/// .threads(4)
/// .options(vec![Bowtie2Opt::flag("--local"), Bowtie2Opt::value("--np", 5)]);
///
/// let sam = request.run(&toolchain).unwrap();
/// assert!(sam.is_file());
/// ```
#[derive(Clone, Debug)]
pub struct AlignRequest {
    read_files: Vec<PathBuf>,
    references: ReferenceSource,
    paired: bool,
    output_name: String,
    index_name: Option<String>,
    working_dir: Option<PathBuf>,
    include_control: bool,
    threads: usize,
    options: Vec<Bowtie2Opt>,
}

impl AlignRequest {
    pub fn new(
        read_files: Vec<PathBuf>,
        references: ReferenceSource,
        paired: bool,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            read_files,
            references,
            paired,
            output_name: output_name.into(),
            index_name: None,
            working_dir: None,
            include_control: true,
            threads: 2,
            options: Vec::new(),
        }
    }

    /// Sets the base name for the reference index files. Defaults to a
    /// timestamp-derived name when unset.
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Sets the directory the staged FASTA, index files, and alignment
    /// output are placed in. Defaults to the parent directory of the first
    /// read file.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Whether to merge the bundled phiX control sequence into the reference
    /// set.
    pub fn include_control(mut self, include: bool) -> Self {
        self.include_control = include;
        self
    }

    /// Thread count forwarded to bowtie2 as `--threads`. Zero omits the flag.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Free-form options appended to the command line in input order, after
    /// `--threads` and before `-x`.
    pub fn options(mut self, options: Vec<Bowtie2Opt>) -> Self {
        self.options = options;
        self
    }

    /// Stages the reference sequences, builds the index, and runs bowtie2.
    ///
    /// Blocks until the child process exits. Returns the absolute path of
    /// the alignment file, which is guaranteed to exist on success.
    pub fn run(&self, toolchain: &Bowtie2Toolchain) -> Result<PathBuf, Error> {
        if self.paired && self.read_files.len() != 2 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "paired alignment requires exactly two read files",
            )));
        }

        let mut references = self.references.resolve()?;
        if self.include_control {
            references.push(reference::control_record());
        }

        let requested_dir = self.working_dir.clone();
        let working_dir = match &requested_dir {
            Some(dir) => dir.clone(),
            None => self
                .read_files
                .first()
                .and_then(|f| f.parent())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        };

        let index_name = match &self.index_name {
            Some(name) => name.clone(),
            None => timestamp_token(),
        };
        let index_base = join_base(&working_dir, &index_name);
        let output_path = join_base(&working_dir, &self.output_name);

        // The record list is written back out as a FASTA file for
        // bowtie2-build regardless of how the references came in.
        let mut staged_os = index_base.clone().into_os_string();
        staged_os.push(".fasta");
        let mut staged_fasta = PathBuf::from(staged_os);
        if let Some(dir) = &requested_dir {
            fs::create_dir_all(dir)?;
            let staged_name = staged_fasta.to_string_lossy().into_owned();
            staged_fasta = join_base(dir, &staged_name);
        }
        reference::write_reference_fasta(&references, &staged_fasta)?;

        let index = reference::build_reference(
            toolchain,
            &staged_fasta,
            &index_name,
            requested_dir.as_deref(),
        )?;

        let args = build_args(
            &index,
            &self.read_files,
            self.paired,
            &output_path,
            self.threads,
            &self.options,
        )?;

        let aligner = toolchain.aligner();
        log::debug!("{} {}", aligner.display(), args.join(" "));

        // No shell: option values and paths with spaces or metacharacters
        // pass through verbatim.
        let output = Command::new(&aligner).args(&args).output()?;
        if !output.status.success() {
            return Err(Error::AlignmentExecution {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let output_path = std::path::absolute(&output_path)?;
        if !output_path.is_file() {
            return Err(Error::AlignmentOutputMissing(output_path));
        }

        log::info!("bowtie2 finished: {}", output_path.display());
        Ok(output_path)
    }
}

/// Runs a single alignment. Equivalent to [AlignRequest::run].
pub fn align(toolchain: &Bowtie2Toolchain, request: &AlignRequest) -> Result<PathBuf, Error> {
    request.run(toolchain)
}

/// Builds the full bowtie2 argument vector.
///
/// Order is `--threads`, user options, `-x`, the read files, `-S`. Read and
/// output paths are absolutized; every element is a plain string.
fn build_args(
    index_base: &Path,
    read_files: &[PathBuf],
    paired: bool,
    output_path: &Path,
    threads: usize,
    options: &[Bowtie2Opt],
) -> Result<Vec<String>, Error> {
    let mut args: Vec<String> = Vec::new();

    if threads > 0 {
        args.push("--threads".to_string());
        args.push(threads.to_string());
    }
    for opt in options {
        opt.render(&mut args);
    }

    args.push("-x".to_string());
    args.push(index_base.to_string_lossy().into_owned());

    if paired {
        args.push("-1".to_string());
        args.push(absolute_str(&read_files[0])?);
        args.push("-2".to_string());
        args.push(absolute_str(&read_files[1])?);
    } else {
        for file in read_files {
            args.push("-U".to_string());
            args.push(absolute_str(file)?);
        }
    }

    args.push("-S".to_string());
    args.push(absolute_str(output_path)?);

    Ok(args)
}

fn absolute_str(path: &Path) -> Result<String, Error> {
    Ok(std::path::absolute(path)?.to_string_lossy().into_owned())
}

/// Joins the base filename of `name` onto `dir`, discarding any directory
/// components `name` came with.
fn join_base(dir: &Path, name: &str) -> PathBuf {
    let base = Path::new(name)
        .file_name()
        .unwrap_or_else(|| OsStr::new(name));
    dir.join(base)
}

/// Default index base name: the current timestamp with the `:`, `-`, space,
/// and `.` characters stripped, leaving digits only.
pub(crate) fn timestamp_token() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}{:09}", now.as_secs(), now.subsec_nanos())
}

// Tests
#[cfg(test)]
mod tests {

    #[cfg(unix)]
    fn fake_toolchain(
        dir: &std::path::Path,
        aligner_script: &str,
    ) -> crate::platform::Bowtie2Toolchain {
        use std::os::unix::fs::PermissionsExt;

        let variant = dir.join("bowtie2-2.2.8-linux");
        std::fs::create_dir_all(&variant).unwrap();
        for (name, script) in [("bowtie2-build", "#!/bin/sh\nexit 0\n"), ("bowtie2", aligner_script)] {
            let path = variant.join(name);
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        crate::platform::Bowtie2Toolchain::for_os(dir, "linux").unwrap()
    }

    // Writes the file named by the argument after -S.
    #[cfg(unix)]
    const ALIGNER_OK: &str = "#!/bin/sh
prev=\"\"
for a in \"$@\"; do
  if [ \"$prev\" = \"-S\" ]; then printf 'sam\\n' > \"$a\"; fi
  prev=\"$a\"
done
exit 0
";

    #[test]
    fn options_render_in_order_and_skip_empty_values() {
        use super::Bowtie2Opt;

        let options = vec![
            Bowtie2Opt::value("--np", 5),
            Bowtie2Opt::value("--local", ""),
            Bowtie2Opt::flag("--no-sq"),
            Bowtie2Opt::value("--n-ceil", "L,0,100"),
        ];

        let mut args: Vec<String> = Vec::new();
        for opt in &options {
            opt.render(&mut args);
        }

        assert_eq!(args, vec!["--np", "5", "--local", "--no-sq", "--n-ceil", "L,0,100"]);
    }

    #[test]
    fn paired_args_follow_the_bowtie2_contract() {
        use std::path::Path;
        use std::path::PathBuf;
        use super::Bowtie2Opt;
        use super::build_args;

        let reads = vec![PathBuf::from("r1.fastq"), PathBuf::from("r2.fastq")];
        let args = build_args(
            Path::new("work/myref"),
            &reads,
            true,
            Path::new("work/out.sam"),
            4,
            &[Bowtie2Opt::flag("--local")],
        )
        .unwrap();

        assert_eq!(args[0..3], ["--threads", "4", "--local"]);
        assert_eq!(args[3..5], ["-x", "work/myref"]);
        assert_eq!(args[5], "-1");
        assert!(Path::new(&args[6]).is_absolute() && args[6].ends_with("r1.fastq"));
        assert_eq!(args[7], "-2");
        assert!(Path::new(&args[8]).is_absolute() && args[8].ends_with("r2.fastq"));
        assert_eq!(args[9], "-S");
        assert!(Path::new(&args[10]).is_absolute() && args[10].ends_with("out.sam"));
        assert_eq!(args.len(), 11);
    }

    #[test]
    fn unpaired_args_repeat_u_per_file() {
        use std::path::Path;
        use std::path::PathBuf;
        use super::build_args;

        let reads = vec![
            PathBuf::from("a.fastq"),
            PathBuf::from("b.fastq"),
            PathBuf::from("c.fastq"),
        ];
        let args = build_args(Path::new("myref"), &reads, false, Path::new("out.sam"), 0, &[]).unwrap();

        let n_unpaired = args.iter().filter(|a| *a == "-U").count();
        assert_eq!(n_unpaired, 3);
        assert!(!args.contains(&"--threads".to_string()));
        assert!(!args.contains(&"-1".to_string()));
    }

    #[test]
    fn timestamp_token_is_filesystem_safe() {
        use super::timestamp_token;

        let token = timestamp_token();
        assert!(!token.is_empty());
        assert!(token.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn missing_reference_file_fails_before_execution() {
        use std::path::Path;
        use std::path::PathBuf;
        use crate::error::Error;
        use crate::platform::Bowtie2Toolchain;
        use crate::reference::ReferenceSource;
        use super::AlignRequest;

        let toolchain = Bowtie2Toolchain::for_os(Path::new("executables"), "linux").unwrap();
        let request = AlignRequest::new(
            vec![PathBuf::from("r1.fastq")],
            ReferenceSource::FastaFile("does/not/exist.fasta".into()),
            false,
            "out.sam",
        );

        let got = request.run(&toolchain);
        assert!(matches!(got, Err(Error::MissingInput(_))));
    }

    #[cfg(unix)]
    #[test]
    fn run_returns_existing_alignment_and_stages_control() {
        use crate::reference::ReferenceRecord;
        use crate::reference::ReferenceSource;
        use super::AlignRequest;

        let dir = tempfile::tempdir().unwrap();
        let toolchain = fake_toolchain(dir.path(), ALIGNER_OK);

        let r1 = dir.path().join("r1.fastq");
        std::fs::write(&r1, "@r\nACGT\n+\nIIII\n").unwrap();

        let records = vec![ReferenceRecord { name: "bc1".to_string(), sequence: "ACGTACGT".to_string() }];
        let request = AlignRequest::new(
            vec![r1],
            ReferenceSource::Records(records),
            false,
            "out.sam",
        )
        .index_name("myref");

        let sam = request.run(&toolchain).unwrap();
        assert!(sam.is_file());
        assert!(sam.is_absolute());
        assert!(sam.ends_with("out.sam"));

        let staged = std::fs::read_to_string(dir.path().join("myref.fasta")).unwrap();
        assert_eq!(staged, ">bc1\nACGTACGT\n>phix\n".to_string() + &crate::reference::control_record().sequence + "\n");
    }

    #[cfg(unix)]
    #[test]
    fn control_merge_is_idempotent_across_runs() {
        use crate::reference::ReferenceRecord;
        use crate::reference::ReferenceSource;
        use super::AlignRequest;

        let staged_contents = |dir: &tempfile::TempDir| {
            let toolchain = fake_toolchain(dir.path(), ALIGNER_OK);
            let r1 = dir.path().join("r1.fastq");
            std::fs::write(&r1, "@r\nACGT\n+\nIIII\n").unwrap();

            let records = vec![ReferenceRecord { name: "bc1".to_string(), sequence: "ACGT".to_string() }];
            AlignRequest::new(vec![r1], ReferenceSource::Records(records), false, "out.sam")
                .index_name("myref")
                .run(&toolchain)
                .unwrap();

            std::fs::read_to_string(dir.path().join("myref.fasta")).unwrap()
        };

        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        assert_eq!(staged_contents(&first), staged_contents(&second));
    }

    #[cfg(unix)]
    #[test]
    fn aligner_failure_carries_stderr() {
        use crate::error::Error;
        use crate::reference::ReferenceSource;
        use super::AlignRequest;

        let dir = tempfile::tempdir().unwrap();
        let toolchain = fake_toolchain(dir.path(), "#!/bin/sh\necho 'bad index' >&2\nexit 1\n");

        let r1 = dir.path().join("r1.fastq");
        std::fs::write(&r1, "@r\nACGT\n+\nIIII\n").unwrap();

        let request = AlignRequest::new(
            vec![r1],
            ReferenceSource::Records(Vec::new()),
            false,
            "out.sam",
        );

        let got = request.run(&toolchain);
        match got {
            Err(Error::AlignmentExecution { code, stderr }) => {
                assert_eq!(code, 1);
                assert!(stderr.contains("bad index"));
            },
            other => panic!("expected AlignmentExecution, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn clean_exit_without_output_is_a_distinct_error() {
        use crate::error::Error;
        use crate::reference::ReferenceSource;
        use super::AlignRequest;

        let dir = tempfile::tempdir().unwrap();
        let toolchain = fake_toolchain(dir.path(), "#!/bin/sh\nexit 0\n");

        let r1 = dir.path().join("r1.fastq");
        std::fs::write(&r1, "@r\nACGT\n+\nIIII\n").unwrap();

        let request = AlignRequest::new(
            vec![r1],
            ReferenceSource::Records(Vec::new()),
            false,
            "out.sam",
        );

        let got = request.run(&toolchain);
        assert!(matches!(got, Err(Error::AlignmentOutputMissing(_))));
    }
}
