use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use slimgo::driver::{self, DEFAULT_REPO};
use slimgo::{host_remover, DenyList, DryRunRemover, PlatformIdentifiers, Pruner, RemoveAll};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Build a minimal Go installation: clone, build, then remove everything not needed to compile Go programs",
    long_about = None
)]
struct Args {
    /// Where to create the installation (must not exist)
    destination: PathBuf,

    /// Repository location
    #[arg(long, default_value = DEFAULT_REPO)]
    repo: String,

    /// Keep an optional deny-list group (pprof, gofmt, doc, pack)
    #[arg(long, short, value_name = "GROUP", value_delimiter = ',')]
    keep: Vec<String>,

    /// Use this deny-list TOML instead of the built-in one
    #[arg(long, value_name = "FILE")]
    denylist: Option<PathBuf>,

    /// Clone and build, then list what would be pruned without removing it
    #[arg(long)]
    dry_run: bool,

    /// Show each removal and skipped scan entry
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "slimgo=debug" } else { "slimgo=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let denylist = DenyList::load(args.denylist.as_deref())?;
    denylist.check_keep(&args.keep)?;

    // Checked before anything is spawned
    driver::ensure_absent(&args.destination)?;

    let platform = PlatformIdentifiers::host();

    println!("{}", format!("Cloning {}", args.repo).bold());
    driver::clone(&args.repo, &args.destination)?;

    println!("{}", format!("Building Go for {}", platform).bold());
    driver::build(&args.destination, &platform)?;

    println!("{}", "Pruning".bold());
    let remover: Box<dyn RemoveAll> = if args.dry_run {
        Box::new(DryRunRemover)
    } else {
        host_remover(&platform)
    };
    let report = Pruner::new(&args.destination, platform, &denylist, remover)
        .keep(args.keep.iter().cloned())
        .run()?;

    if args.dry_run {
        println!("Dry run mode: No files were deleted.");
    } else {
        println!(
            "{}",
            format!(
                "Minimal Go installation ready at {} ({} paths and {} test artifacts removed)",
                args.destination.display(),
                report.static_removed,
                report.test_artifacts_removed
            )
            .green()
        );
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(err) = run(&args) {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}
