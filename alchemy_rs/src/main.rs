//! Algorithmic chemistry command line.
//!
//! Generates random terms, runs a single soup, or runs an ensemble of soups
//! in parallel. Results go to stdout, logs to stderr.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alchemy_rs::{
    Ensemble, EnsembleConfig, Generator, Reactor, Seed, Soup, Standardization,
    StochasticDepthGenerator, StochasticGenConfig, TreeGenConfig, TreeGenerator,
};

#[derive(Parser)]
#[command(name = "alchemy")]
#[command(about = "Algorithmic chemistry on lambda calculus terms", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level, used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print random expressions, one per line
    Generate {
        /// Bind free variables with outer abstractions before printing
        #[arg(long)]
        close: bool,

        #[command(subcommand)]
        generator: GeneratorCommand,
    },

    /// Seed a soup with tree-generated expressions, simulate, print a JSON snapshot
    Simulate {
        #[command(flatten)]
        tree: TreeArgs,

        #[command(flatten)]
        soup: SoupArgs,

        /// Log every reaction round at info level
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run isolated soups in parallel, printing one JSON line per soup
    Ensemble {
        #[command(flatten)]
        tree: TreeArgs,

        #[command(flatten)]
        soup: SoupArgs,

        /// Number of soups
        #[arg(long, default_value_t = 8)]
        soups: usize,

        /// Number of worker threads (default: number of CPUs)
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[derive(Subcommand)]
enum GeneratorCommand {
    /// Terms of an exact size, shaped by a random binary tree
    Tree {
        #[command(flatten)]
        tree: TreeArgs,

        /// Number of expressions
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },

    /// Terms grown top-down between a minimum and a maximum depth
    Stochastic {
        #[arg(long, default_value_t = 0.3)]
        abs_min: f64,

        #[arg(long, default_value_t = 0.5)]
        abs_max: f64,

        #[arg(long, default_value_t = 0.3)]
        app_min: f64,

        #[arg(long, default_value_t = 0.5)]
        app_max: f64,

        #[arg(long, default_value_t = 1)]
        min_depth: u32,

        #[arg(long, default_value_t = 8)]
        max_depth: u32,

        /// Probability that a leaf is a free variable
        #[arg(long, default_value_t = 0.1)]
        freevar_probability: f64,

        #[arg(long, default_value_t = 3)]
        max_free_vars: u32,

        /// prefix, postfix or none
        #[arg(long, default_value = "prefix")]
        standardization: Standardization,

        /// Seed: an integer or 64 hex digits
        #[arg(long, value_parser = parse_seed)]
        seed: Option<Seed>,

        /// Number of expressions
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
}

#[derive(Args)]
struct TreeArgs {
    /// Exact number of nodes per term
    #[arg(long, default_value_t = 20)]
    size: usize,

    /// Probability that a leaf is a free variable
    #[arg(long, default_value_t = 0.5)]
    freevar_probability: f64,

    #[arg(long, default_value_t = 3)]
    max_free_vars: u32,

    /// prefix, postfix or none
    #[arg(long, default_value = "prefix")]
    standardization: Standardization,

    /// Seed: an integer or 64 hex digits
    #[arg(long, value_parser = parse_seed)]
    seed: Option<Seed>,
}

impl TreeArgs {
    fn config(&self, seed: Seed) -> TreeGenConfig {
        TreeGenConfig {
            size: self.size,
            freevar_probability: self.freevar_probability,
            max_free_vars: self.max_free_vars,
            standardization: self.standardization,
            seed,
        }
    }
}

#[derive(Args)]
struct SoupArgs {
    /// JSON file with reactor parameters
    #[arg(long)]
    reactor: Option<PathBuf>,

    /// Initial expressions per soup
    #[arg(short, long, default_value_t = 100)]
    expressions: usize,

    /// Reaction rounds per soup
    #[arg(short, long, default_value_t = 1000)]
    steps: usize,

    /// Most frequent forms to report
    #[arg(long, default_value_t = 5)]
    top: usize,
}

fn parse_seed(s: &str) -> Result<Seed, String> {
    if let Ok(value) = s.parse::<u64>() {
        return Ok(Seed::from_u64(value));
    }
    Seed::from_hex(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Commands::Generate { close, generator } => run_generate(generator, close, &mut out)?,
        Commands::Simulate {
            tree,
            soup,
            verbose,
        } => run_simulate(&tree, &soup, verbose, &mut out)?,
        Commands::Ensemble {
            tree,
            soup,
            soups,
            workers,
        } => run_ensemble(&tree, &soup, soups, workers, &mut out)?,
    }

    out.flush()?;
    Ok(())
}

fn load_reactor(path: Option<&Path>) -> Result<Reactor> {
    let Some(path) = path else {
        return Ok(Reactor::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading reactor file {}", path.display()))?;
    let reactor = serde_json::from_str(&text)
        .with_context(|| format!("parsing reactor file {}", path.display()))?;
    Ok(reactor)
}

fn run_generate(command: GeneratorCommand, close: bool, out: &mut impl Write) -> Result<()> {
    let expressions = match command {
        GeneratorCommand::Tree { tree, count } => {
            let config = tree.config(tree.seed.unwrap_or_default());
            TreeGenerator::from_config(&config)?.generate_n(count)
        }
        GeneratorCommand::Stochastic {
            abs_min,
            abs_max,
            app_min,
            app_max,
            min_depth,
            max_depth,
            freevar_probability,
            max_free_vars,
            standardization,
            seed,
            count,
        } => {
            let config = StochasticGenConfig {
                abstraction_range: (abs_min, abs_max),
                application_range: (app_min, app_max),
                min_depth,
                max_depth,
                free_variable_probability: freevar_probability,
                max_free_vars,
                standardization,
                seed: seed.unwrap_or_default(),
            };
            StochasticDepthGenerator::from_config(&config)?.generate_n(count)
        }
    };

    for expr in expressions {
        if close {
            // A closed term renders the same under every standardization.
            writeln!(out, "{}", expr.term().close().render(Standardization::None))?;
        } else {
            writeln!(out, "{}", expr)?;
        }
    }
    Ok(())
}

fn run_simulate(tree: &TreeArgs, args: &SoupArgs, verbose: bool, out: &mut impl Write) -> Result<()> {
    let mut reactor = load_reactor(args.reactor.as_deref())?;
    let base = Seed::from_bytes(tree.seed.unwrap_or_default().get());
    // The generator and the soup draw from different streams.
    if tree.seed.is_some() || reactor.seed.0.is_none() {
        reactor.seed = base.derive(0);
    }

    let mut generator = TreeGenerator::from_config(&tree.config(base.derive(1)))?;
    let mut soup = Soup::from_config(&reactor)?;
    soup.perturb(generator.generate_n(args.expressions));

    let executed = soup.simulate_for(args.steps, verbose);
    info!(
        executed,
        reactions = soup.reactions(),
        collisions = soup.collisions(),
        "simulation complete"
    );

    serde_json::to_writer_pretty(&mut *out, &soup.snapshot(args.top))?;
    writeln!(out)?;
    Ok(())
}

fn run_ensemble(
    tree: &TreeArgs,
    args: &SoupArgs,
    soups: usize,
    workers: Option<usize>,
    out: &mut impl Write,
) -> Result<()> {
    let num_workers = workers.unwrap_or_else(num_cpus::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .build_global()
        .context("building the worker pool")?;

    let config = EnsembleConfig {
        soups,
        expressions_per_soup: args.expressions,
        steps: args.steps,
        top: args.top,
        generator: tree.config(Seed::default()),
        reactor: load_reactor(args.reactor.as_deref())?,
        seed: tree.seed.unwrap_or_default(),
    };
    let ensemble = Ensemble::new(config)?;
    info!(
        soups,
        workers = num_workers,
        seed = ?ensemble.base_seed().to_hex(),
        "running ensemble"
    );

    for run in ensemble.run()? {
        serde_json::to_writer(&mut *out, &run)?;
        writeln!(out)?;
    }
    Ok(())
}
