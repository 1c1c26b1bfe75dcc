use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use icon_debug_patcher::config::{load_from_path, PatchConfig};
use icon_debug_patcher::driver::{self, RunOptions};
use icon_debug_patcher::targets::{builtin_targets, MissingFilePolicy, Target};
use icon_debug_patcher::{logging, RootGuard};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const ROOT_ENV: &str = "ICON_DEBUG_PATCHER_ROOT";

#[derive(Parser)]
#[command(name = "icon-debug-patcher")]
#[command(
    about = "Inject env-gated icon selection debug logging into landing page UI blocks",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Log verbosity on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Defaults to `apply` with no options
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch the target files
    Apply(ApplyArgs),

    /// Show per-rule status without modifying files
    Status(TargetArgs),

    /// List targets, their files and rules
    List {
        /// Optional TOML config with per-target overrides
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
struct TargetArgs {
    /// Project root (auto-detected if not specified)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Optional TOML config with per-target overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only run the named target (repeatable)
    #[arg(long = "only", value_name = "ID")]
    only: Vec<String>,
}

#[derive(Args, Default)]
struct ApplyArgs {
    #[command(flatten)]
    targets: TargetArgs,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Exit non-zero when a file is missing, a target fails, or an anchor is not found
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}", format!("Warning: logging disabled: {e}").yellow());
    }

    match cli.command.unwrap_or(Commands::Apply(ApplyArgs::default())) {
        Commands::Apply(args) => cmd_apply(args),
        Commands::Status(args) => cmd_status(args),
        Commands::List { config } => cmd_list(config),
    }
}

fn load_config(path: Option<&Path>) -> Result<PatchConfig> {
    match path {
        Some(path) => Ok(load_from_path(path)?),
        None => Ok(PatchConfig::default()),
    }
}

/// Built-in targets with config overrides and `--only` filtering applied.
fn select_targets(config: &PatchConfig, only: &[String]) -> Result<Vec<Target>> {
    let targets = config.apply_overrides(builtin_targets()?);

    if only.is_empty() {
        return Ok(targets);
    }

    if let Some(unknown) = only.iter().find(|id| !targets.iter().any(|t| &t.id == *id)) {
        anyhow::bail!("unknown or disabled target '{unknown}'");
    }

    Ok(targets
        .into_iter()
        .filter(|t| only.contains(&t.id))
        .collect())
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Resolve the project root using multiple detection strategies
///
/// Priority order:
/// 1. Explicit --root flag
/// 2. ICON_DEBUG_PATCHER_ROOT environment variable
/// 3. `meta.project_root` from the config file
/// 4. Auto-detect from current directory
fn resolve_root(cli_root: Option<&Path>, config: &PatchConfig) -> Result<PathBuf> {
    if let Some(path) = cli_root {
        let path = expand_home(path);
        return path
            .canonicalize()
            .with_context(|| format!("project root {} does not exist", path.display()));
    }

    if let Ok(env_path) = env::var(ROOT_ENV) {
        let path = expand_home(Path::new(&env_path));
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: {ROOT_ENV} is set but path doesn't exist: {env_path}").yellow()
        );
    }

    if let Some(path) = &config.meta.project_root {
        let path = expand_home(path);
        return path
            .canonicalize()
            .with_context(|| format!("config project_root {} does not exist", path.display()));
    }

    if let Some(path) = auto_detect_root() {
        println!(
            "{}",
            format!("Auto-detected project root: {}", path.display()).dimmed()
        );
        return Ok(path);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find the landing page project root.".red(),
        "Try one of:".bold(),
        "1. cd into the project: cd /path/to/app && icon-debug-patcher apply",
        "2. Specify explicitly: icon-debug-patcher apply --root /path/to/app",
        "3. Set environment variable: export ICON_DEBUG_PATCHER_ROOT=/path/to/app"
    )
}

/// Walk up from the current directory to the first Next.js app that has the
/// UI block tree.
fn auto_detect_root() -> Option<PathBuf> {
    let current = env::current_dir().ok()?;

    current
        .ancestors()
        .find(|dir| dir.join("package.json").exists() && dir.join("src/modules/UIBlocks").is_dir())
        .map(Path::to_path_buf)
}

fn prepare(args: &TargetArgs) -> Result<(RootGuard, Vec<Target>)> {
    let config = load_config(args.config.as_deref())?;
    let root = resolve_root(args.root.as_deref(), &config)?;
    debug!(root = %root.display(), "resolved project root");

    let guard = RootGuard::new(&root)?;
    let targets = select_targets(&config, &args.only)?;
    Ok((guard, targets))
}

fn cmd_apply(args: ApplyArgs) -> Result<()> {
    let (guard, targets) = prepare(&args.targets)?;

    let options = RunOptions {
        dry_run: args.dry_run,
        show_diff: args.diff,
    };

    let summary = driver::run(&targets, &guard, &options, &mut io::stdout().lock())?;

    if summary.should_fail(args.strict) {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_status(args: TargetArgs) -> Result<()> {
    let (guard, targets) = prepare(&args)?;
    driver::status(&targets, &guard, &mut io::stdout().lock())?;
    Ok(())
}

fn cmd_list(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let targets = select_targets(&config, &[])?;

    for target in &targets {
        let on_missing = match target.missing_file {
            MissingFilePolicy::Report => "report",
            MissingFilePolicy::Propagate => "error",
        };
        println!(
            "{} {} ({})",
            target.id.as_str().bold(),
            target.file.display(),
            target.component
        );
        println!("  missing file: {}", on_missing);
        for rule in &target.rules {
            println!("  - {}", rule.name());
        }
    }

    Ok(())
}
