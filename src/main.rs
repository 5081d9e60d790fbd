#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use waypoint::adapters::{
    ClusterClient, FixedVersion, MemoryCluster, ReleaseStatusDetector, StdinConfirmer,
    VersionDetector,
};
use waypoint::catalog::{action_registry, check_registry};
use waypoint::constants::DEFAULT_OUTPUT_DIR;
use waypoint::logging::{JsonlSink, LogAudit};
use waypoint::policy::Policy;
use waypoint::render::{
    render_lint, render_migration_outcome, render_migration_report, render_migrations,
    OutputFormat,
};
use waypoint::types::{CheckGroup, Group, Version};
use waypoint::{
    exit_code_for, exit_code_for_lint, exit_code_for_migration, ApiError, ErrorId, LintRequest,
    MigrateRequest, MigrationFilter, Phases, Waypoint,
};

#[derive(Parser, Debug)]
#[command(name = "waypoint", version)]
#[command(about = "Upgrade-readiness checks and guarded migrations")]
struct Cli {
    /// YAML fixture describing cluster state (multi-document).
    #[arg(long, global = true)]
    cluster_state: Option<PathBuf>,
    /// Overall deadline in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Policy file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Append structured facts to this file as JSON lines.
    #[arg(long, global = true)]
    facts: Option<PathBuf>,
    /// Skip detection and use this as the current version.
    #[arg(long, global = true)]
    current_version: Option<String>,
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run checks against the cluster; with --target-version, assess an upgrade.
    Lint(LintArgs),
    #[command(subcommand)]
    Migrate(MigrateCommand),
}

#[derive(Args, Debug)]
struct LintArgs {
    #[arg(long)]
    target_version: Option<String>,
    /// Selector: `*`, a category name, or a glob over check ids. Repeatable.
    #[arg(long = "checks")]
    checks: Vec<String>,
    /// Restrict selection to one category.
    #[arg(long)]
    category: Option<String>,
    #[arg(long, short, default_value = "table")]
    output: OutputFormat,
    #[arg(long)]
    fail_on_critical: Option<bool>,
    #[arg(long)]
    fail_on_warning: Option<bool>,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// List migrations.
    List {
        #[arg(long, conflicts_with = "target_version", required_unless_present = "target_version")]
        all: bool,
        #[arg(long)]
        target_version: Option<String>,
        #[arg(long, short, default_value = "table")]
        output: OutputFormat,
    },
    /// Run migrations in order; stops at the first failure.
    Run {
        #[command(flatten)]
        common: MigrateArgs,
        #[arg(long)]
        dry_run: bool,
        /// Do not ask before mutating the cluster.
        #[arg(long, short)]
        yes: bool,
        /// Run each migration's prepare phase first.
        #[arg(long)]
        prepare: bool,
    },
    /// Run only the prepare phase (validation and backups).
    Prepare {
        #[command(flatten)]
        common: MigrateArgs,
    },
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[arg(short = 'm', long = "migration", required = true)]
    migrations: Vec<String>,
    #[arg(long)]
    target_version: String,
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    #[arg(long, short, default_value = "table")]
    output: OutputFormat,
}

struct Failure {
    code: i32,
    msg: String,
}

impl From<ApiError> for Failure {
    fn from(e: ApiError) -> Self {
        Self {
            code: e.exit_code(),
            msg: e.to_string(),
        }
    }
}

fn generic(msg: String) -> Failure {
    Failure {
        code: exit_code_for(ErrorId::E_GENERIC),
        msg,
    }
}

fn parse_version(raw: &str, what: &str) -> Result<Version, Failure> {
    Version::parse(raw).map_err(|e| generic(format!("invalid {what}: {e}")))
}

fn load_policy(cli: &Cli) -> Result<Policy, Failure> {
    let mut policy = match &cli.config {
        Some(p) => Policy::load(p).map_err(|e| generic(format!("loading {}: {e}", p.display())))?,
        None => Policy::default(),
    };
    if let Some(secs) = cli.timeout {
        policy.timeout_ms = secs.saturating_mul(1000);
    }
    Ok(policy)
}

fn load_cluster(path: Option<&Path>) -> Result<Arc<dyn ClusterClient>, Failure> {
    let Some(path) = path else {
        return Err(generic(
            "no cluster connection configured; pass --cluster-state <FILE>".to_string(),
        ));
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| generic(format!("reading {}: {e}", path.display())))?;
    let cluster = MemoryCluster::from_yaml(&text)
        .map_err(|e| generic(format!("loading {}: {e}", path.display())))?;
    Ok(Arc::new(cluster))
}

fn log_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// `RUST_LOG` wins over `-v` when set.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn print(text: Result<String, waypoint::types::Error>) -> Result<(), Failure> {
    let text = text.map_err(|e| generic(format!("rendering output: {e}")))?;
    print!("{text}");
    Ok(())
}

fn run(cli: Cli) -> Result<i32, Failure> {
    let mut policy = load_policy(&cli)?;
    if let Command::Lint(args) = &cli.command {
        if let Some(b) = args.fail_on_critical {
            policy.thresholds.fail_on_critical = b;
        }
        if let Some(b) = args.fail_on_warning {
            policy.thresholds.fail_on_warning = b;
        }
    }
    let facts = match &cli.facts {
        Some(p) => JsonlSink::to_path(p)
            .map_err(|e| generic(format!("opening {}: {e}", p.display())))?,
        None => JsonlSink::default(),
    };
    let checks = check_registry().map_err(|e| generic(format!("building check catalog: {e}")))?;
    let actions =
        action_registry().map_err(|e| generic(format!("building action catalog: {e}")))?;
    let mut api = Waypoint::new(facts, LogAudit, policy)
        .with_checks(checks)
        .with_actions(actions);

    if let Command::Migrate(MigrateCommand::List {
        all: true, output, ..
    }) = &cli.command
    {
        return print(render_migrations(
            &api.list_migrations(&Version::new(0, 0, 0), &MigrationFilter::All),
            *output,
        ))
        .map(|()| 0);
    }

    let deadline = api.deadline();
    let client = load_cluster(cli.cluster_state.as_deref())?;
    let detector: Box<dyn VersionDetector> = match &cli.current_version {
        Some(v) => Box::new(FixedVersion(parse_version(v, "--current-version")?)),
        None => Box::new(ReleaseStatusDetector),
    };
    let current = api.detect_version(&deadline, detector.as_ref(), client.as_ref())?;

    match cli.command {
        Command::Lint(args) => {
            let goal = match &args.target_version {
                Some(v) => parse_version(v, "--target-version")?,
                None => current.clone(),
            };
            let category = match &args.category {
                Some(c) => Some(CheckGroup::from_selector(c).ok_or_else(|| {
                    Failure::from(ApiError::Selection(format!("unknown category `{c}`")))
                })?),
                None => None,
            };
            let target = api.target(client, current).with_target_version(goal);
            let req = LintRequest {
                patterns: args.checks,
                category,
            };
            let report = api.lint(&deadline, &target, &req)?;
            print(render_lint(&report, args.output))?;
            Ok(exit_code_for_lint(&report.checks, &api.policy().thresholds))
        }
        Command::Migrate(MigrateCommand::List {
            target_version,
            output,
            ..
        }) => {
            let filter = match target_version {
                Some(v) => MigrationFilter::ForTarget(parse_version(&v, "--target-version")?),
                None => MigrationFilter::All,
            };
            print(render_migrations(&api.list_migrations(&current, &filter), output))?;
            Ok(0)
        }
        Command::Migrate(MigrateCommand::Run {
            common,
            dry_run,
            yes,
            prepare,
        }) => {
            let phases = if prepare {
                Phases::PrepareThenExecute
            } else {
                Phases::Execute
            };
            let target = api
                .target(client, current)
                .with_target_version(parse_version(&common.target_version, "--target-version")?)
                .with_dry_run(dry_run)
                .with_skip_confirm(yes)
                .with_output_dir(common.output_dir)
                .with_confirmer(Arc::new(StdinConfirmer));
            let streamed = common.output == OutputFormat::Table;
            if streamed {
                api = api.with_step_stream(std::io::stdout());
            }
            let req = MigrateRequest {
                ids: common.migrations,
                phases,
            };
            let report = api.migrate(&deadline, &target, &req)?;
            if streamed {
                print!("{}", render_migration_outcome(&report));
            } else {
                print(render_migration_report(&report, common.output))?;
            }
            if let Some(e) = report.error() {
                eprintln!("waypoint: {e}");
            }
            Ok(exit_code_for_migration(&report))
        }
        Command::Migrate(MigrateCommand::Prepare { common }) => {
            let target = api
                .target(client, current)
                .with_target_version(parse_version(&common.target_version, "--target-version")?)
                .with_output_dir(common.output_dir);
            let req = MigrateRequest {
                ids: common.migrations,
                phases: Phases::PrepareOnly,
            };
            let report = api.migrate(&deadline, &target, &req)?;
            print(render_migration_report(&report, common.output))?;
            if let Some(e) = report.error() {
                eprintln!("waypoint: {e}");
            }
            Ok(exit_code_for_migration(&report))
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let code = match run(cli) {
        Ok(code) => code,
        Err(f) => {
            eprintln!("waypoint: {}", f.msg);
            f.code
        }
    };
    std::process::exit(code);
}
