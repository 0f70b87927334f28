use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use jsonnet_analyzer::ast::{pretty, Document};
use jsonnet_analyzer::location::uri_from_path;
use jsonnet_analyzer::parse::parse_jsonnet;
use jsonnet_analyzer::{DocumentLoader, FsSourceStore, ScopeResolver};
use lsp_service::WorkspaceService;

#[derive(Parser)]
#[command(name = "jsonnet-ls", version, about = "Jsonnet language service and inspection tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the language service over stdio.
    Serve,
    /// Print a tree for one Jsonnet file (`-` reads stdin).
    Tree {
        path: PathBuf,
        #[arg(short = 't', long = "tree-type", value_enum, default_value_t = TreeType::Jsonnet)]
        tree_type: TreeType,
    },
    /// Parse and scope-resolve one file against a workspace root (for
    /// benchmarking the analysis pipeline).
    Index {
        workspace_root: PathBuf,
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TreeType {
    /// The lowered Jsonnet AST.
    #[value(name = "j")]
    Jsonnet,
    /// The raw tree-sitter CST.
    #[value(name = "t")]
    TreeSitter,
    /// The resolved variable scope tree.
    #[value(name = "s")]
    Scope,
}

/// `JSONNET_LS_SEARCH_PATHS`: `:`-separated import search directories.
fn search_dirs_from_env() -> Vec<PathBuf> {
    std::env::var("JSONNET_LS_SEARCH_PATHS")
        .map(|raw| raw.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env; logs must go to stderr to keep stdout clean for LSP.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => {
            let mut service = WorkspaceService::new(Box::new(FsSourceStore));
            service.set_search_dirs(search_dirs_from_env());
            lsp_service::run_stdio(service).await;
            Ok(())
        }
        Command::Tree { path, tree_type } => tree_command(&path, tree_type),
        Command::Index {
            workspace_root,
            path,
        } => index_command(&workspace_root, &path),
    }
}

fn tree_command(path: &Path, tree_type: TreeType) -> Result<()> {
    let (uri, source) = if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("reading stdin")?;
        let uri = uri_from_path(Path::new("/dev/stdin")).context("stdin uri")?;
        (uri, source)
    } else {
        let absolute = path
            .canonicalize()
            .with_context(|| format!("resolving {}", path.display()))?;
        let source = std::fs::read_to_string(&absolute)
            .with_context(|| format!("reading {}", absolute.display()))?;
        let uri = uri_from_path(&absolute).context("file uri")?;
        (uri, source)
    };

    let rendered = match tree_type {
        TreeType::TreeSitter => {
            let tree = parse_jsonnet(&source)?;
            pretty::cst_tree(&tree, &source)
        }
        TreeType::Jsonnet | TreeType::Scope => {
            let mut doc = Document::from_source(uri, source)?;
            ScopeResolver::resolve(&mut doc);
            match tree_type {
                TreeType::Jsonnet => pretty::ast_tree(&doc),
                _ => pretty::scope_tree(&doc),
            }
        }
    };

    println!("{rendered}");
    Ok(())
}

fn index_command(workspace_root: &Path, path: &Path) -> Result<()> {
    let root = workspace_root
        .canonicalize()
        .with_context(|| format!("resolving {}", workspace_root.display()))?;
    let file = path
        .canonicalize()
        .with_context(|| format!("resolving {}", path.display()))?;
    let uri = uri_from_path(&file).context("file uri")?;

    let search_dirs = search_dirs_from_env()
        .into_iter()
        .map(|d| if d.is_absolute() { d } else { root.join(&d) })
        .collect::<Vec<_>>();

    let mut loader = DocumentLoader::new(Box::new(FsSourceStore), root);
    if !search_dirs.is_empty() {
        loader.set_search_dirs(search_dirs);
    }

    let started = Instant::now();
    let Some(doc) = loader.get(&uri) else {
        bail!("failed to index {}", file.display());
    };
    info!(
        uri = %doc.uri(),
        nodes = doc.node_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "indexed"
    );
    println!(
        "{}: {} nodes in {:?}",
        doc.uri(),
        doc.node_count(),
        started.elapsed()
    );
    Ok(())
}
