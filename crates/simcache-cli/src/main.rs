//! simcache CLI: read-only inspection of recipe directories.

use clap::{Parser, Subcommand};
use simcache_core::config::CacheConfig;
use simcache_core::id::RecipeId;
use simcache_recipe::recipe::RECIPE_PREFIX;
use simcache_recipe::DependencyRecorder;
use simcache_store::ResultStore;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "simcache")]
#[command(about = "Inspect content-addressed simulation result caches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipe directories under a cache root
    List {
        /// Cache root (defaults to SIMCACHE_ROOT or ./recipes/recipe_runs)
        root: Option<PathBuf>,
    },

    /// Show the id, result keys, and dependencies of one recipe directory
    Show {
        /// Recipe directory `<kind>_<fingerprint>`
        dir: PathBuf,
    },

    /// Print the dependency tree of a recipe directory
    Tree {
        /// Recipe directory `<kind>_<fingerprint>`
        dir: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = ResultStore::fs();

    let out = match cli.command {
        Commands::List { root } => {
            let root = root.unwrap_or_else(|| CacheConfig::from_env().root_dir);
            list(&store, &root)
        }
        Commands::Show { dir } => show(&store, &dir),
        Commands::Tree { dir } => tree(&store, &dir),
    };

    match out {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Recipe id encoded in a directory's file name.
fn dir_id(dir: &Path) -> CliResult<RecipeId> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("{} has no usable directory name", dir.display()))?;
    Ok(name.parse()?)
}

fn list(store: &ResultStore, root: &Path) -> CliResult<String> {
    let mut out = String::new();
    for dir in store.storage().list(root)? {
        let Ok(id) = dir_id(&dir) else {
            tracing::debug!(path = %dir.display(), "skipping non-recipe entry");
            continue;
        };
        let mark = if store.available(RECIPE_PREFIX, &dir) {
            "cached"
        } else {
            "empty"
        };
        writeln!(out, "{:<8} {}", mark, id)?;
    }
    Ok(out)
}

fn show(store: &ResultStore, dir: &Path) -> CliResult<String> {
    let id = dir_id(dir)?;
    let mut out = String::new();
    writeln!(out, "kind:        {}", id.kind())?;
    writeln!(out, "fingerprint: {}", id.fingerprint())?;

    if store.available(RECIPE_PREFIX, dir) {
        let results = store.load(RECIPE_PREFIX, dir)?;
        let keys: Vec<&str> = results.keys().collect();
        writeln!(out, "results:     {}", keys.join(", "))?;
        writeln!(
            out,
            "stamped:     {}",
            if results.snapshot().is_some() { "yes" } else { "no" }
        )?;
    } else {
        writeln!(out, "results:     (none)")?;
    }

    match DependencyRecorder::new(store.storage()).read(dir) {
        Ok(deps) if deps.is_empty() => writeln!(out, "dependencies: (none)")?,
        Ok(deps) => {
            writeln!(out, "dependencies:")?;
            for d in deps {
                writeln!(out, "  {d}")?;
            }
        }
        Err(e) if e.is_not_found() => writeln!(out, "dependencies: (not recorded)")?,
        Err(e) => return Err(e.into()),
    }
    Ok(out)
}

fn tree(store: &ResultStore, dir: &Path) -> CliResult<String> {
    let mut out = String::new();
    let mut seen = BTreeSet::new();
    let name = dir_id(dir)?.dir_name();
    let parent = dir.parent().unwrap_or_else(|| Path::new(""));
    walk(store, parent, &name, 0, &mut seen, &mut out)?;
    Ok(out)
}

/// Dependencies resolve as siblings of the recipe directory.
fn walk(
    store: &ResultStore,
    root: &Path,
    name: &str,
    depth: usize,
    seen: &mut BTreeSet<String>,
    out: &mut String,
) -> CliResult<()> {
    let dir = root.join(name);
    let mark = if store.available(RECIPE_PREFIX, &dir) {
        ""
    } else {
        " (no results)"
    };
    if !seen.insert(name.to_string()) {
        writeln!(out, "{}{} (cycle)", "  ".repeat(depth), name)?;
        return Ok(());
    }
    writeln!(out, "{}{}{}", "  ".repeat(depth), name, mark)?;

    let deps = match DependencyRecorder::new(store.storage()).read(&dir) {
        Ok(deps) => deps,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    for dep in deps {
        walk(store, root, &dep, depth + 1, seen, out)?;
    }
    seen.remove(name);
    Ok(())
}
