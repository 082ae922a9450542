//! Minimal CLI: codec transforms, tree printing, table generation, checking,
//! and jq queries over parsed documents.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::codec;
use crate::grammar;
use crate::node::{NodeId, Tree};
use crate::semantic::{check_tree, Rule, UnknownPolicy};
use crate::table;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// parse JSON into a typed tree and validate it against a semantic table
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// encode raw text as JSON-safe string content
    Encode(EncodeCmd),
    /// decode JSON string content back to raw text
    Decode(DecodeCmd),
    /// parse documents and print their JSON view
    Tree(TreeCmd),
    /// generate a semantic table from an exemplar document
    Table(TableCmd),
    /// validate documents against a semantic table
    Check(CheckCmd),
    /// run a jq filter over parsed documents
    Query(QueryCmd),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct EncodeCmd {
    /// raw text to encode
    text: String,
}

#[derive(clap::Parser, Debug)]
struct DecodeCmd {
    /// JSON-escaped text to decode
    text: String,
}

#[derive(clap::Parser, Debug)]
struct TreeCmd {
    #[command(flatten)]
    input_settings: InputSettings,

    /// dump the node records instead of the JSON view
    #[arg(long)]
    facts: bool,
}

#[derive(clap::Parser, Debug)]
struct TableCmd {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    #[command(flatten)]
    input_settings: InputSettings,

    /// semantic table file to check against
    #[arg(long)]
    table: PathBuf,

    /// ignore nodes the table does not cover instead of flagging them
    #[arg(long, default_value_t = false)]
    allow_unknown: bool,
}

#[derive(clap::Parser, Debug)]
struct QueryCmd {
    #[command(flatten)]
    input_settings: InputSettings,

    /// jq filter expression
    #[arg(long)]
    expr: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn resolve(&self) -> Result<Vec<PathBuf>> {
        resolve_file_path_patterns(&self.input)
    }

    fn load_each(&self, mut apply: impl FnMut(&PathBuf, Tree, NodeId) -> Result<()>) -> Result<()> {
        for path in self.resolve()? {
            let (tree, root) = parse_file(&path)?;
            apply(&path, tree, root)?;
        }
        Ok(())
    }
}

fn parse_file(path: &PathBuf) -> Result<(Tree, NodeId)> {
    let source = std::fs::read(path)
        .with_context(|| format!("failed to read source file {}", path.display()))?;
    grammar::parse(&source).map_err(|err| anyhow::anyhow!("{}: {err}", path.display()))
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Encode(target) => {
                if target.text.is_empty() {
                    bail!("nothing to encode");
                }
                println!("{}", codec::encode(target.text.as_bytes()));
                Ok(())
            }
            Command::Decode(target) => {
                let decoded = codec::decode(target.text.as_bytes())?;
                println!("{}", String::from_utf8_lossy(&decoded));
                Ok(())
            }
            Command::Tree(target) => target.input_settings.load_each(|path, tree, root| {
                eprintln!("{}", path.display());
                if target.facts {
                    println!("{tree:#?}");
                } else {
                    let view = serde_json::to_string_pretty(&tree.to_value(root))?;
                    println!("{view}");
                }
                Ok(())
            }),
            Command::Table(target) => {
                // Per-document specs, concatenated; merging bounds across
                // exemplars is the author's edit, not the tool's guess.
                let mut specs = Vec::new();
                target.input_settings.load_each(|_, tree, root| {
                    specs.extend(table::generate(&tree, root));
                    Ok(())
                })?;
                let out_src = serde_json::to_string_pretty(&specs)?;
                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(out, &out_src)?;
                    }
                    None => println!("{out_src}"),
                }
                Ok(())
            }
            Command::Check(target) => run_check(target),
            Command::Query(target) => target.input_settings.load_each(|_, tree, root| {
                let results = crate::query::run_filter(&target.expr, &tree.to_value(root))?;
                for line in results {
                    println!("{line}");
                }
                Ok(())
            }),
        }
    }
}

fn run_check(target: &CheckCmd) -> Result<()> {
    let table_src = std::fs::read_to_string(&target.table)
        .with_context(|| format!("failed to read table file {}", target.table.display()))?;
    let rules = table::load_rules(&table_src)
        .map_err(|err| anyhow::anyhow!("{}: {err}", target.table.display()))?;
    let policy = if target.allow_unknown { UnknownPolicy::Allow } else { UnknownPolicy::Deny };

    let paths = target.input_settings.resolve()?;

    // Rule counts are caller-owned state, so every file checks against its
    // own copy of the table; the trees are per-file anyway.
    let failures: usize = paths
        .par_iter()
        .map(|path| {
            let mut rules: Vec<Rule> = rules.clone();
            match parse_file(path) {
                Err(err) => {
                    eprintln!("{} {err}", "✗".red());
                    1
                }
                Ok((tree, root)) => {
                    let errors = check_tree(&tree, root, &mut rules, policy);
                    if errors.is_empty() {
                        eprintln!("{} {}", "✓".green(), path.display());
                        0
                    } else {
                        eprintln!(
                            "{} {}: {} violation(s)",
                            "✗".red(),
                            path.display(),
                            errors.len()
                        );
                        for err in &errors {
                            eprintln!("    {err}");
                        }
                        1
                    }
                }
            }
        })
        .sum();

    if failures > 0 {
        bail!("{failures} of {} input(s) failed validation", paths.len());
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
