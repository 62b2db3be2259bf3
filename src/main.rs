use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use syntax_morph::{Node, Project, SourceFile, Statemented, TransformNode};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "syntax-morph")]
#[command(about = "Inspect and rewrite source files through stable syntax nodes", long_about = None)]
#[command(version)]
struct Cli {
    /// Project settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Output {
    /// Write the result back to the file
    #[arg(short, long)]
    write: bool,

    /// Show a unified diff instead of the new text
    #[arg(short, long)]
    diff: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the structural tree of a file
    Tree {
        file: PathBuf,

        /// Emit JSON instead of an indented outline
        #[arg(long)]
        json: bool,
    },

    /// Print the nodes captured by a tree-sitter query
    Query {
        file: PathBuf,

        /// S-expression query
        #[arg(short, long)]
        query: String,

        /// Capture name to print (without the `@`)
        #[arg(short = 'C', long)]
        capture: String,
    },

    /// Replace the text of every node of a kind
    Rewrite {
        file: PathBuf,

        #[arg(short, long)]
        kind: String,

        /// Replacement text
        #[arg(short, long)]
        text: String,

        #[command(flatten)]
        output: Output,
    },

    /// Insert top-level statements
    Insert {
        file: PathBuf,

        /// Statement index to insert at (defaults to the end)
        #[arg(short, long)]
        index: Option<usize>,

        /// Statement text; repeat for several
        #[arg(short, long = "statement", required = true)]
        statements: Vec<String>,

        #[command(flatten)]
        output: Output,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let project = match &cli.config {
        Some(path) => Project::from_settings_path(path)?,
        None => Project::new(),
    };

    match cli.command {
        Commands::Tree { file, json } => cmd_tree(&project, &file, json),
        Commands::Query {
            file,
            query,
            capture,
        } => cmd_query(&project, &file, &query, &capture),
        Commands::Rewrite {
            file,
            kind,
            text,
            output,
        } => cmd_rewrite(&project, &file, &kind, &text, &output),
        Commands::Insert {
            file,
            index,
            statements,
            output,
        } => cmd_insert(&project, &file, index, &statements, &output),
    }
}

fn open(project: &Project, path: &Path) -> Result<(SourceFile, String)> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file = project.create_source_file(path, text.clone())?;
    debug!(path = %path.display(), bytes = text.len(), "loaded source file");
    Ok((file, text))
}

fn cmd_tree(project: &Project, path: &Path, as_json: bool) -> Result<()> {
    let (file, _) = open(project, path)?;
    if as_json {
        let value = project.run_scoped(|_| node_json(file.node()))?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        project.run_scoped(|_| print_outline(file.node(), 0))?;
    }
    Ok(())
}

fn node_json(node: &Node) -> Result<Value> {
    let children = node
        .structural_children()?
        .iter()
        .map(node_json)
        .collect::<Result<Vec<_>>>()?;
    let mut value = json!({
        "kind": node.kind()?,
        "start": node.start()?,
        "end": node.end()?,
    });
    if children.is_empty() {
        value["text"] = json!(node.text()?);
    } else {
        value["children"] = json!(children);
    }
    Ok(value)
}

fn print_outline(node: &Node, depth: usize) -> Result<()> {
    let children = node.structural_children()?;
    let label = format!("{}{}", "  ".repeat(depth), node.kind()?);
    let span = format!("[{}..{}]", node.start()?, node.end()?).dimmed();
    if children.is_empty() {
        println!("{label} {span} {:?}", node.text()?);
    } else {
        println!("{label} {span}");
    }
    for child in &children {
        print_outline(child, depth + 1)?;
    }
    Ok(())
}

fn cmd_query(project: &Project, path: &Path, query: &str, capture: &str) -> Result<()> {
    let (file, _) = open(project, path)?;
    let nodes = file.node().query(query, capture)?;
    for node in &nodes {
        println!(
            "{}:{} {} {}",
            path.display(),
            node.start_line_number()?,
            node.kind()?.cyan(),
            node.text()?
        );
    }
    info!(matches = nodes.len(), "query finished");
    Ok(())
}

fn cmd_rewrite(
    project: &Project,
    path: &Path,
    kind: &str,
    text: &str,
    output: &Output,
) -> Result<()> {
    let (file, before) = open(project, path)?;
    // Fails with a suggestion on a misspelled kind.
    file.node().first_descendant_of_kind_or_err(kind)?;
    file.node().transform(|ctl| {
        let node = ctl.visit_children();
        if node.kind() == kind {
            return TransformNode::synthetic(kind, text);
        }
        node
    })?;
    finish(path, &before, &file.full_text()?, output)
}

fn cmd_insert(
    project: &Project,
    path: &Path,
    index: Option<usize>,
    statements: &[String],
    output: &Output,
) -> Result<()> {
    let (file, before) = open(project, path)?;
    let statements: Vec<&str> = statements.iter().map(String::as_str).collect();
    let inserted = match index {
        Some(index) => file.insert_statements(index, &statements)?,
        None => file.add_statements(&statements)?,
    };
    info!(inserted = inserted.len(), "inserted statements");
    finish(path, &before, &file.full_text()?, output)
}

fn finish(path: &Path, before: &str, after: &str, output: &Output) -> Result<()> {
    if output.diff {
        display_diff(path, before, after);
    } else if !output.write {
        print!("{after}");
    }
    if output.write && before != after {
        atomic_write(path, after.as_bytes())?;
        println!("{} {}", "Wrote".green(), path.display());
    }
    Ok(())
}

/// Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (modified)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{sign}");
    }
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
