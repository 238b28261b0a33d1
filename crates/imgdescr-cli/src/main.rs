use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command as Process;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use imgdescr::{find_description, Anchor, Loader, LoaderConfig, Substitution};
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "imgdescr",
    version,
    about = "Resolve inheritance chains of appliance descriptions"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// Base directory of relative inherit paths
    #[arg(long, value_enum, default_value_t = AnchorArg::Document, global = true)]
    relative_to: AnchorArg,
    /// Longest accepted inheritance chain, 0 for no limit
    #[arg(long, default_value_t = 64, global = true)]
    max_depth: u16,
    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print or write the resolved description
    Resolve {
        /// Description file or appliance directory
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Print the inheritance chain, root ancestor first
    Chain {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the description by its resolved form until Enter is pressed
    /// or the given command finishes
    Substitute {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Command to run while substituted
        #[arg(long, value_name = "CMD", num_args = 1.., allow_hyphen_values = true)]
        exec: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AnchorArg {
    Document,
    Cwd,
}

impl From<AnchorArg> for Anchor {
    fn from(value: AnchorArg) -> Self {
        match value {
            AnchorArg::Document => Self::Document,
            AnchorArg::Cwd => Self::WorkingDirectory,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let loader = Loader::new(LoaderConfig::new(args.max_depth, args.relative_to.into()));
    match args.command {
        Command::Resolve { path, output } => resolve(&loader, &path, output.as_deref()),
        Command::Chain { path, json } => chain(&loader, &path, json),
        Command::Substitute { path, exec } => substitute(&loader, &path, &exec),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn locate(path: &Path) -> Result<PathBuf> {
    find_description(path)
        .with_context(|| format!("failed to locate a description in {}", path.display()))
}

fn resolve(loader: &Loader, path: &Path, output: Option<&Path>) -> Result<()> {
    let start = locate(path)?;
    let mut resolved = loader
        .load(&start)
        .with_context(|| format!("failed to resolve {}", start.display()))?;
    resolved.push('\n');

    match output {
        Some(output) => std::fs::write(output, resolved)
            .with_context(|| format!("failed to write output file {}", output.display())),
        None => io::stdout()
            .write_all(resolved.as_bytes())
            .context("failed to write stdout"),
    }
}

fn chain(loader: &Loader, path: &Path, json: bool) -> Result<()> {
    let start = locate(path)?;
    let chain = loader
        .resolve(&start)
        .with_context(|| format!("failed to resolve {}", start.display()))?;

    let mut out = if json {
        serde_json::to_string_pretty(&chain).context("failed to serialize chain")?
    } else {
        chain
            .paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };
    out.push('\n');
    io::stdout()
        .write_all(out.as_bytes())
        .context("failed to write stdout")
}

fn substitute(loader: &Loader, path: &Path, exec: &[String]) -> Result<()> {
    let start = locate(path)?;
    let resolved = loader
        .load(&start)
        .with_context(|| format!("failed to resolve {}", start.display()))?;
    let guard = Substitution::apply(&start, &resolved)
        .with_context(|| format!("failed to substitute {}", start.display()))?;

    let outcome = match exec.split_first() {
        Some((program, rest)) => {
            info!("Running {program}");
            Process::new(program)
                .args(rest)
                .status()
                .with_context(|| format!("failed to run {program}"))
                .and_then(|status| {
                    if status.success() {
                        Ok(())
                    } else {
                        bail!("{program} exited with {status}")
                    }
                })
        }
        None => wait_for_enter(guard.path()),
    };

    let restored = guard
        .restore()
        .with_context(|| format!("failed to restore {}", start.display()));
    outcome.and(restored)
}

fn wait_for_enter(path: &Path) -> Result<()> {
    let mut stderr = io::stderr();
    writeln!(
        stderr,
        "{} is substituted, press Enter to restore the original",
        path.display()
    )
    .context("failed to write stderr")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read stdin")?;
    Ok(())
}
