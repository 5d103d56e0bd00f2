//! The `fix` and `check` commands.

use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use bpaf::{Bpaf, ShellComp};

use kubemend_fix::FixOptions;
use kubemend_reporters::{ReporterKind, make_reporter};

use crate::GlobalOptions;

#[derive(Debug, Clone, Bpaf)]
pub struct FixArgs {
    /// Output format for the change log
    #[bpaf(
        long("reporter"),
        argument("pretty|text|json"),
        fallback(ReporterKind::Pretty)
    )]
    pub reporter: ReporterKind,

    /// Rewrite the input file in place
    #[bpaf(long("write"), switch)]
    pub write: bool,

    /// Write the repaired manifest to PATH instead of stdout
    #[bpaf(long("output"), short('o'), argument("PATH"))]
    pub output: Option<PathBuf>,

    /// Confidence below which changes are downgraded to warnings
    #[bpaf(long("threshold"), argument("FLOAT"), fallback(0.7))]
    pub threshold: f64,

    /// Enable lower-confidence structural fixes
    #[bpaf(long("aggressive"), switch)]
    pub aggressive: bool,

    /// Upper bound on error-driven repair rounds
    #[bpaf(long("max-iterations"), argument("N"), fallback(3))]
    pub max_iterations: usize,

    /// Spaces per indentation level for inserted structure
    #[bpaf(long("indent"), argument("N"), fallback(2))]
    pub indent: usize,

    /// Report what would change without applying anything
    #[bpaf(long("no-fix"), switch)]
    pub no_fix: bool,

    /// Input file, or `-` for stdin
    #[bpaf(positional("FILE"), complete_shell(ShellComp::File { mask: None }))]
    pub file: String,
}

impl FixArgs {
    fn report_only(&self, check_only: bool) -> bool {
        check_only || self.no_fix
    }

    fn options(&self, check_only: bool) -> FixOptions {
        FixOptions {
            confidence_threshold: self.threshold,
            aggressive: self.aggressive,
            max_iterations: self.max_iterations,
            indent_size: self.indent,
            auto_fix: !self.report_only(check_only),
        }
    }
}

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {file}"))
    }
}

/// Run the pipeline over one input. Returns `true` when parse errors
/// remain, which becomes exit code 1.
///
/// # Errors
///
/// Returns an error on I/O failure or incompatible flags.
pub fn run(args: &FixArgs, global: &GlobalOptions, check_only: bool) -> Result<bool> {
    if args.write && args.file == "-" {
        bail!("--write needs a file argument, not stdin");
    }

    let content = read_input(&args.file)?;
    let options = args.options(check_only);
    tracing::debug!(file = %args.file, bytes = content.len(), check_only, "running pipeline");

    let start = Instant::now();
    let report = kubemend_fix::fix(&content, &options);
    let elapsed = start.elapsed();

    let mut reporter = make_reporter(args.reporter, global.verbose);
    reporter.report(&report, elapsed);

    // The JSON reporter already carries the fixed content; for the other
    // reporters the repaired text goes wherever the user pointed it.
    if !args.report_only(check_only) && args.reporter != ReporterKind::Json {
        if args.write {
            std::fs::write(&args.file, &report.content)
                .with_context(|| format!("failed to write {}", args.file))?;
        } else if let Some(path) = &args.output {
            std::fs::write(path, &report.content)
                .with_context(|| format!("failed to write {}", path.display()))?;
        } else {
            print!("{}", report.content);
        }
    }

    Ok(!report.is_valid)
}
