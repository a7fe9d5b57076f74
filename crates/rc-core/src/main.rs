//! Reddcast - redd-count productivity projection CLI
//!
//! Subcommands:
//! - `check`: load and validate the input tables, report dimensions
//! - `spec`: validate a model specification and emit canonical JSON for
//!   the external sampler
//! - `project`: run the Monte Carlo scenario projections
//! - `curves`: write stock-recruitment rule-curve tables

use clap::{Args, Parser, Subcommand};
use rc_common::{Error, OutputFormat, PopulationId, Result};
use rc_config::{CovariateStore, FutureProjectionTable, PopulationTable};
use rc_core::curve::RuleCurve;
use rc_core::exit_codes::ExitCode;
use rc_core::logging::{init_logging, LogConfig, LogFormat};
use rc_core::model::ModelSpec;
use rc_core::output::{self, CurveWriter};
use rc_core::posterior::{ParameterSummaryTable, PosteriorStore};
use rc_core::projection::{ProjectionConfig, ProjectionEngine, ScenarioProjection};
use rc_core::scenario::load_scenarios;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reddcast - population productivity projection from redd counts
#[derive(Parser)]
#[command(name = "reddcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format for stdout payloads
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log format (human, json)
    #[arg(long, global = true, default_value = "human")]
    log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable ANSI colors in human-format logs
    #[arg(long, global = true)]
    no_color: bool,
}

/// Reference-table paths shared by most commands
#[derive(Args, Debug)]
struct TableOpts {
    /// Covariate summary CSV (name, mean, sd, bounds, interactions)
    #[arg(long, env = "REDDCAST_COVARIATES")]
    covariates: PathBuf,

    /// Population summary CSV
    #[arg(long, env = "REDDCAST_POPULATIONS")]
    populations: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate all input tables, report dimensions
    Check(CheckArgs),
    /// Validate a model spec and emit canonical JSON for the sampler
    Spec(SpecArgs),
    /// Project scenarios through the posterior draws
    Project(ProjectArgs),
    /// Write stock-recruitment rule-curve tables
    Curves(CurvesArgs),
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    tables: TableOpts,

    /// Posterior draws CSV
    #[arg(long)]
    posterior: Option<PathBuf>,

    /// Future covariate projections CSV
    #[arg(long)]
    future: Option<PathBuf>,

    /// Scenario definitions JSON
    #[arg(long)]
    scenarios: Option<PathBuf>,
}

#[derive(Args)]
struct SpecArgs {
    /// Model specification JSON
    #[arg(long)]
    model: PathBuf,
}

#[derive(Args)]
struct ProjectArgs {
    #[command(flatten)]
    tables: TableOpts,

    /// Posterior draws CSV
    #[arg(long)]
    posterior: PathBuf,

    /// Scenario definitions JSON
    #[arg(long)]
    scenarios: PathBuf,

    /// Output directory for the projection tables
    #[arg(long)]
    out_dir: PathBuf,

    /// Number of posterior draws to use (default: all)
    #[arg(long)]
    draws: Option<usize>,

    /// Use a seeded random draw subset instead of even thinning
    #[arg(long)]
    seed: Option<u64>,

    /// Credible-interval mass for summaries
    #[arg(long, default_value_t = 0.95)]
    interval: f64,
}

#[derive(Args)]
struct CurvesArgs {
    #[command(flatten)]
    tables: TableOpts,

    /// Posterior draws CSV
    #[arg(long)]
    posterior: PathBuf,

    /// Parameter summary CSV; when absent, summaries are computed from
    /// the draws
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Scenario definitions JSON
    #[arg(long)]
    scenarios: PathBuf,

    /// Restrict to one population (short name)
    #[arg(long)]
    population: Option<String>,

    /// Use one posterior draw instead of the point summary
    #[arg(long)]
    draw: Option<usize>,

    /// Upper end of the spawner sweep
    #[arg(long, default_value_t = 500.0)]
    max_spawners: f64,

    /// Spawner grid step
    #[arg(long, default_value_t = 5.0)]
    step: f64,

    /// Output CSV path (stdout when absent)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(
        &LogConfig::from_verbosity(cli.global.verbose, cli.global.quiet, cli.global.log_format)
            .with_color(!cli.global.no_color),
    );

    let format = cli.global.format;
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            match format {
                OutputFormat::Json => eprintln!("{}", e.to_json_value()),
                OutputFormat::Csv => eprintln!("error: {}", e),
            }
            ExitCode::from(&e)
        }
    };
    std::process::exit(code.code());
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Spec(args) => run_spec(args),
        Commands::Project(args) => run_project(args, cli.global.format),
        Commands::Curves(args) => run_curves(args),
    }
}

fn run_check(args: CheckArgs) -> Result<ExitCode> {
    let covariates = CovariateStore::load(&args.tables.covariates)?;
    let populations = PopulationTable::load(&args.tables.populations)?;
    let mut report = serde_json::json!({
        "covariates": covariates.len(),
        "populations": populations.len(),
    });
    if let Some(path) = &args.posterior {
        let posterior = PosteriorStore::load(path)?;
        if posterior.covariate_count() != covariates.len() {
            return Err(Error::InvalidTable {
                table: "posterior_draws".into(),
                detail: format!(
                    "posterior has {} covariates, covariate table has {}",
                    posterior.covariate_count(),
                    covariates.len()
                ),
            });
        }
        ProjectionEngine::new(&posterior, &populations)?;
        report["draws"] = posterior.len().into();
    }
    if let Some(path) = &args.future {
        let future = FutureProjectionTable::load(path)?;
        report["future_rows"] = future.rows().len().into();
    }
    if let Some(path) = &args.scenarios {
        let scenarios = load_scenarios(path, &covariates)?;
        report["scenarios"] = scenarios.len().into();
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::Clean)
}

fn run_spec(args: SpecArgs) -> Result<ExitCode> {
    let spec = ModelSpec::load(&args.model)?;
    println!("{}", spec.to_json()?);
    Ok(ExitCode::Clean)
}

fn run_project(args: ProjectArgs, format: OutputFormat) -> Result<ExitCode> {
    let covariates = CovariateStore::load(&args.tables.covariates)?;
    let populations = PopulationTable::load(&args.tables.populations)?;
    let posterior = PosteriorStore::load(&args.posterior)?;
    let scenarios = load_scenarios(&args.scenarios, &covariates)?;

    let engine = ProjectionEngine::new(&posterior, &populations)?;
    let config = ProjectionConfig {
        draws: args.draws,
        seed: args.seed,
        interval_mass: args.interval,
    };
    let results = engine.project_batch(&scenarios, &config)?;

    let mut projections: Vec<ScenarioProjection> = Vec::new();
    let mut failed = 0usize;
    for (name, result) in results {
        match result {
            Ok(p) => projections.push(p),
            Err(e) => {
                failed += 1;
                tracing::error!(scenario = %name, error = %e, "scenario skipped");
            }
        }
    }
    let refs: Vec<&ScenarioProjection> = projections.iter().collect();

    std::fs::create_dir_all(&args.out_dir)?;
    output::write_productivity(create(&args.out_dir, "productivity.csv")?, &refs)?;
    output::write_recruitment(create(&args.out_dir, "recruitment.csv")?, &refs, &populations)?;
    output::write_totals(create(&args.out_dir, "totals.csv")?, &refs)?;
    let summary = output::summary_json(&refs, &populations, args.interval);
    let mut summary_file = create(&args.out_dir, "summary.json")?;
    writeln!(summary_file, "{}", serde_json::to_string_pretty(&summary)?)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Csv => {
            for p in &refs {
                let total = p.total_delta_summary(args.interval);
                match total {
                    Some(t) => println!(
                        "{}: total recruitment change median {:.2} [{:.2}, {:.2}]{}",
                        p.scenario,
                        t.median,
                        t.lower,
                        t.upper,
                        if p.extrapolated { " (extrapolated)" } else { "" }
                    ),
                    None => println!("{}: no finite results", p.scenario),
                }
            }
        }
    }

    if failed > 0 {
        tracing::warn!(failed, "some scenarios failed");
        Ok(ExitCode::PartialFail)
    } else {
        Ok(ExitCode::Clean)
    }
}

fn run_curves(args: CurvesArgs) -> Result<ExitCode> {
    let covariates = CovariateStore::load(&args.tables.covariates)?;
    let populations = PopulationTable::load(&args.tables.populations)?;
    let posterior = PosteriorStore::load(&args.posterior)?;
    let scenarios = load_scenarios(&args.scenarios, &covariates)?;

    ProjectionEngine::new(&posterior, &populations)?;

    let summary_table = match &args.summary {
        Some(path) => ParameterSummaryTable::load(path)?,
        None => ParameterSummaryTable::from_summaries(&posterior.summarize(0.95)),
    };

    let selected: Vec<PopulationId> = match &args.population {
        Some(short_name) => vec![populations.id(short_name)?],
        None => populations.iter().map(|(j, _)| j).collect(),
    };

    let sink: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = CurveWriter::new(sink);
    let mut failed = 0usize;
    for scenario in &scenarios {
        for &j in &selected {
            let curve = match args.draw {
                Some(d) => {
                    if d >= posterior.len() {
                        return Err(Error::DrawCountExceeded {
                            requested: d + 1,
                            available: posterior.len(),
                        });
                    }
                    let view = posterior.view(rc_common::DrawId(d));
                    RuleCurve::from_draw(&view, j, scenario, args.max_spawners, args.step)
                }
                None => summary_table
                    .ricker_point(j, posterior.covariate_count())
                    .and_then(|point| {
                        RuleCurve::from_point(&point, j, scenario, args.max_spawners, args.step)
                    }),
            };
            match curve {
                Ok(curve) => {
                    writer.append(scenario.name(), &populations.get(j).short_name, curve)?
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        scenario = scenario.name(),
                        population = %populations.get(j).short_name,
                        error = %e,
                        "curve skipped"
                    );
                }
            }
        }
    }
    writer.finish()?;

    if failed > 0 {
        Ok(ExitCode::PartialFail)
    } else {
        Ok(ExitCode::Clean)
    }
}

fn create(dir: &Path, file: &str) -> Result<File> {
    Ok(File::create(dir.join(file))?)
}
