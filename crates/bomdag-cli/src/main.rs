#![forbid(unsafe_code)]

mod output;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use bomdag_core::config::{self, Config};
use bomdag_core::render::write_dot;
use bomdag_core::{Bom, DependencyGraph, GraphStats, SbomError, resolve};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use output::{CliError, GroupsReport, OrderReport, OutputMode, Sequence, StatsReport};

#[derive(Parser, Debug)]
#[command(
    name = "bom-dagger",
    author,
    version,
    about = "Derive deployment order from a CycloneDX SBOM",
    long_about = None,
    after_help = "EXAMPLES:\n    # Show deployment order\n    bom-dagger -i sbom.json\n\n    # Show teardown order\n    bom-dagger -i sbom.json -r\n\n    # Show parallel groups\n    bom-dagger -i sbom.json -g\n\n    # Generate DOT format\n    bom-dagger -i sbom.json -o dot > graph.dot"
)]
struct Cli {
    /// Path to a CycloneDX SBOM file (JSON).
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output mode [default: order].
    #[arg(short, long, value_enum, value_name = "MODE")]
    output: Option<OutputMode>,

    /// Show teardown order instead of deployment order.
    #[arg(short, long)]
    reverse: bool,

    /// Show deployment groups (shorthand for `-o groups`).
    #[arg(short, long)]
    groups: bool,

    /// Print graph statistics before the main output.
    #[arg(short, long)]
    stats: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Read configuration from this file instead of discovering one.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Flags merged over the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    mode: OutputMode,
    sequence: Sequence,
    json: bool,
    stats: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        let mode = if cli.groups {
            OutputMode::Groups
        } else {
            cli.output
                .or_else(|| config.output.mode.map(OutputMode::from))
                .unwrap_or_default()
        };

        Self {
            mode,
            sequence: Sequence::from_reverse(cli.reverse),
            json: cli.json || config.output.json,
            stats: cli.stats,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BOMDAG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "bomdag_core=debug,bom_dagger=debug,warn"
        } else {
            "warn"
        })
    });

    let format = env::var("BOMDAG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, settings: Settings, config: &Config) -> anyhow::Result<()> {
    let bom = Bom::from_path(&cli.input)?;
    let refs = resolve(&bom);
    debug!(
        components = refs.component_count(),
        services = refs.service_count(),
        "resolved references"
    );

    let graph = DependencyGraph::build_with(&bom, &refs, config.build_options())?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "dependency graph built"
    );

    let stats = settings
        .stats
        .then(|| StatsReport::new(&GraphStats::from_graph(&graph), &bom));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&mut out, settings, &graph, stats.as_ref())?;
    out.flush()?;
    Ok(())
}

fn render(
    w: &mut dyn Write,
    settings: Settings,
    graph: &DependencyGraph<'_>,
    stats: Option<&StatsReport>,
) -> anyhow::Result<()> {
    let json = settings.json && settings.mode != OutputMode::Dot;

    if let Some(stats) = stats
        && !json
    {
        output::write_stats(w, stats)?;
    }

    match settings.mode {
        OutputMode::Groups => {
            let groups = graph.deployment_groups()?;
            if json {
                output::write_json(
                    w,
                    &GroupsReport {
                        groups: &groups,
                        stats,
                    },
                )?;
            } else {
                output::write_groups(w, &groups)?;
            }
        }
        OutputMode::Dot => write_dot(graph, w)?,
        OutputMode::Order => {
            let steps = match settings.sequence {
                Sequence::Deploy => graph.topological_sort()?,
                Sequence::Teardown => graph.reverse_topological_sort()?,
            };
            if json {
                output::write_json(
                    w,
                    &OrderReport {
                        mode: settings.sequence,
                        steps: &steps,
                        stats,
                    },
                )?;
            } else {
                output::write_order(w, settings.sequence, &steps)?;
            }
        }
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<SbomError>()
        .map_or(1, |e| e.code().exit_code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mut json = cli.json;
    let result = env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| Ok(config::load_config(cli.config.as_deref(), &cwd)?))
        .and_then(|config| {
            let settings = Settings::resolve(&cli, &config);
            json = settings.json;
            run(&cli, settings, &config)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            let stderr = io::stderr();
            let mut w = stderr.lock();
            // stderr is the last resort; nothing to do if it is gone too.
            let _ = output::write_error(&mut w, json, &CliError::from(&err));
            ExitCode::from(exit_code(&err))
        }
    }
}
