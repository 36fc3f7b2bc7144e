use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use vigil::hash::format_digest;
use vigil::{Blake3Digest, Digest, IntegrityHash, NodeId, Payload, Registry, Tree, TreeConfig};

#[derive(Parser, Debug)]
#[command(name = "vigil", about = "Self-verifying bracket tree toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Payload type stored in tree nodes.
    #[arg(long, value_enum, default_value_t = PayloadKind::Int, global = true)]
    payload: PayloadKind,

    /// Append the detailed log (dumps included) to this file.
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Spaces per depth level when writing trees.
    #[arg(long, default_value_t = vigil::tree::DEFAULT_INDENT_WIDTH, global = true)]
    indent_width: usize,

    /// Lines shown on each side of a syntax error.
    #[arg(long, default_value_t = vigil::tree::DEFAULT_CONTEXT_RADIUS, global = true)]
    context_radius: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a tree file and validate its structure.
    Check {
        /// Bracketed tree file.
        file: PathBuf,
    },
    /// Print the path from the root to the leaf holding a value.
    Find {
        /// Bracketed tree file.
        file: PathBuf,
        /// Leaf payload to look for.
        value: String,
    },
    /// Re-serialize a tree file to stdout.
    Fmt {
        /// Bracketed tree file.
        file: PathBuf,
    },
    /// Print a Graphviz description of a tree file.
    Dot {
        /// Bracketed tree file.
        file: PathBuf,
    },
    /// Print the integrity digests of a file's bytes.
    Hash {
        /// Any file.
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PayloadKind {
    /// Signed 64-bit integers.
    Int,
    /// 64-bit floats.
    Float,
    /// One line of text per node.
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;

    let config = TreeConfig::default()
        .with_indent_width(cli.indent_width)
        .with_context_radius(cli.context_radius);
    let mut registry = Registry::new().with_tree_config(config);

    match cli.payload {
        PayloadKind::Int => run::<i64>(&cli.command, &mut registry),
        PayloadKind::Float => run::<f64>(&cli.command, &mut registry),
        PayloadKind::Text => run::<String>(&cli.command, &mut registry),
    }
}

fn init_logging(log: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(io::stdout))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

fn run<T: Payload>(command: &Commands, registry: &mut Registry) -> Result<()> {
    match command {
        Commands::Check { file } => run_check::<T>(file, registry),
        Commands::Find { file, value } => run_find::<T>(file, value, registry),
        Commands::Fmt { file } => {
            let tree = load_tree::<T>(file, registry)?;
            let stdout = io::stdout();
            tree.write_to(&mut stdout.lock())
                .context("failed to write tree")?;
            Ok(())
        }
        Commands::Dot { file } => {
            let tree = load_tree::<T>(file, registry)?;
            let stdout = io::stdout();
            tree.write_dot(&mut stdout.lock())
                .context("failed to write graph")?;
            Ok(())
        }
        Commands::Hash { file } => run_hash(file),
    }
}

fn load_tree<T: Payload>(path: &Path, registry: &mut Registry) -> Result<Tree<T>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tree from {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("tree");
    registry
        .parse_tree(name, &text)
        .with_context(|| format!("failed to load tree from {}", path.display()))
}

fn run_check<T: Payload>(path: &Path, registry: &mut Registry) -> Result<()> {
    let mut tree = load_tree::<T>(path, registry)?;
    tree.check()
        .with_context(|| format!("tree in {} is inconsistent", path.display()))?;

    let depth = tree
        .preorder()
        .into_iter()
        .filter_map(|id| tree.node(id).map(|node| node.depth()))
        .max();
    match depth {
        Some(depth) => println!(
            "{}\tok\tnodes={}\tdepth={}\ttype={}",
            tree.name(),
            tree.len(),
            depth,
            T::TYPE_NAME
        ),
        None => println!("{}\tok\tempty\ttype={}", tree.name(), T::TYPE_NAME),
    }
    Ok(())
}

fn run_find<T: Payload>(path: &Path, value: &str, registry: &mut Registry) -> Result<()> {
    let tree = load_tree::<T>(path, registry)?;
    let target = T::parse_payload(value).map_err(|reason| anyhow!("bad search value: {}", reason))?;

    let mut route = registry
        .stack::<NodeId>("path")
        .context("failed to allocate path stack")?;
    if !tree.find_path(&mut route, &target)? {
        bail!("no leaf holding {} in {}", target, path.display());
    }

    let values: Vec<String> = tree
        .path_values(&route)?
        .into_iter()
        .map(ToString::to_string)
        .collect();
    println!("{}", values.join(" -> "));
    Ok(())
}

fn run_hash(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let algorithms: [&dyn Digest; 2] = [&IntegrityHash, &Blake3Digest];
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for algo in algorithms {
        writeln!(out, "{}\t{}\t{}", algo.name(), format_digest(algo.digest(&bytes)), path.display())?;
    }
    Ok(())
}
