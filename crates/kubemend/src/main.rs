#![doc = include_str!("../README.md")]

use std::process::ExitCode;

use bpaf::Bpaf;
use tracing_subscriber::prelude::*;

use kubemend_reporters::ReporterKind;

mod commands;

use commands::fix::{FixArgs, fix_args};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl core::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "unknown log level '{s}', expected: debug, info, warn, error"
            )),
        }
    }
}

#[derive(Debug, Clone, Bpaf)]
pub struct GlobalOptions {
    /// Log level for diagnostic output (debug, info, warn, error)
    #[bpaf(long("log-level"), argument("LEVEL"))]
    pub log_level: Option<LogLevel>,

    /// Show per-pass detail and before/after lines
    #[bpaf(long, short, switch)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage, generate(cli))]
/// Repair malformed Kubernetes YAML manifests
struct Cli {
    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("fix"))]
    /// Repair a manifest and emit the fixed text
    Fix(
        #[bpaf(external(global_options), hide_usage)] GlobalOptions,
        #[bpaf(external(fix_args))] FixArgs,
    ),

    #[bpaf(command("check"))]
    /// Report what would change without rewriting anything
    Check(
        #[bpaf(external(global_options), hide_usage)] GlobalOptions,
        #[bpaf(external(fix_args))] FixArgs,
    ),

    #[bpaf(command("version"))]
    /// Print version information
    Version,

    #[bpaf(command("man"), hide)]
    /// Generate man page in roff format
    Man,
}

/// Set up tracing from the CLI flag, falling back to `KUBEMEND_LOG`.
fn setup_tracing(global: &GlobalOptions) {
    let filter = match global.log_level {
        None => match tracing_subscriber::EnvFilter::try_from_env("KUBEMEND_LOG") {
            Ok(f) => f,
            Err(_) => return,
        },
        Some(LogLevel::Debug) => tracing_subscriber::EnvFilter::new("debug"),
        Some(LogLevel::Info) => tracing_subscriber::EnvFilter::new("info"),
        Some(LogLevel::Warn) => tracing_subscriber::EnvFilter::new("warn"),
        Some(LogLevel::Error) => tracing_subscriber::EnvFilter::new("error"),
    };

    tracing_subscriber::registry()
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true)
                .with_indent_lines(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn setup_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();
}

fn main() -> ExitCode {
    let opts = cli().run();

    let result = match opts.command {
        Commands::Fix(global, args) => {
            setup_tracing(&global);
            setup_miette();
            commands::fix::run(&args, &global, false)
        }
        Commands::Check(global, args) => {
            setup_tracing(&global);
            setup_miette();
            commands::fix::run(&args, &global, true)
        }
        Commands::Version => {
            println!("kubemend {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Commands::Man => {
            let roff = cli().render_manpage(
                "kubemend",
                bpaf::doc::Section::General,
                None,
                None,
                Some("Kubemend Manual"),
            );
            print!("{roff}");
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(had_errors) => {
            if had_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_fix_basic_args() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["fix", "broken.yaml"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Fix(_, args) => {
                assert_eq!(args.file, "broken.yaml");
                assert!(!args.write);
                assert!(!args.no_fix);
                assert!(args.output.is_none());
                assert_eq!(args.reporter, ReporterKind::Pretty);
            }
            _ => panic!("expected Fix"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_fix_all_options() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&[
                "fix",
                "a.yaml",
                "--write",
                "--reporter",
                "json",
                "--threshold",
                "0.5",
                "--aggressive",
                "--max-iterations",
                "5",
                "--indent",
                "4",
                "--no-fix",
            ])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Fix(_, args) => {
                assert!(args.write);
                assert_eq!(args.reporter, ReporterKind::Json);
                assert!((args.threshold - 0.5).abs() < f64::EPSILON);
                assert!(args.aggressive);
                assert_eq!(args.max_iterations, 5);
                assert_eq!(args.indent, 4);
                assert!(args.no_fix);
            }
            _ => panic!("expected Fix"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_check_subcommand() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["check", "-", "--reporter", "text"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Check(_, args) => {
                assert_eq!(args.file, "-");
                assert_eq!(args.reporter, ReporterKind::Text);
            }
            _ => panic!("expected Check"),
        }
        Ok(())
    }

    #[test]
    fn cli_verbose_flag_is_global() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["fix", "--verbose", "x.yaml"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Fix(global, _) => assert!(global.verbose),
            _ => panic!("expected Fix"),
        }
        Ok(())
    }
}
