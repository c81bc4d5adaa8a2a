mod error_formatter;
mod formatter;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ferrule::{
    DataContext, Engine, KnowledgeBase, KnowledgeLibrary, ResourceLimits, DEFAULT_MAX_CYCLES,
};
use formatter::Formatter;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Version given to rule files whose name carries none (`pricing.grl`)
const DEFAULT_VERSION: &str = "0.0.1";

#[derive(Parser)]
#[command(name = "ferrule")]
#[command(about = "A forward-chaining business rule engine.")]
#[command(
    long_about = "Ferrule compiles .grl rule files into versioned rule sets and runs them against JSON facts.\nRules fire one per cycle, highest salience first, until no rule matches."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a rule set against facts and show what fired
    ///
    /// Facts are JSON values bound by name. The final state of every fact is
    /// printed after the session ends.
    Run {
        /// Rule set to execute (format: name or name@version)
        #[arg(value_name = "RULESET[@VERSION]")]
        rule_set: String,
        #[command(flatten)]
        facts: FactArgs,
        #[command(flatten)]
        workspace: WorkspaceArgs,
        /// Give up after this many fired rules
        #[arg(long, default_value_t = DEFAULT_MAX_CYCLES)]
        max_cycles: u64,
        /// Output the final facts as JSON only (for piping to other tools)
        #[arg(short = 'r', long)]
        raw: bool,
    },
    /// Show the rules whose conditions hold, in firing order, without running them
    Match {
        /// Rule set to match against (format: name or name@version)
        #[arg(value_name = "RULESET[@VERSION]")]
        rule_set: String,
        #[command(flatten)]
        facts: FactArgs,
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
    /// Show the rules of a rule set
    Show {
        /// Rule set to show (format: name or name@version)
        #[arg(value_name = "RULESET[@VERSION]")]
        rule_set: String,
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
    /// List all rule sets with their rule counts
    ///
    /// Scans the workspace for .grl files. A file named `pricing@1.2.0.grl`
    /// becomes rule set `pricing` version `1.2.0`; `pricing.grl` gets version 0.0.1.
    List {
        /// Workspace root directory containing .grl files
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

#[derive(Args)]
struct FactArgs {
    /// Facts to bind (format: Name=<json>), overriding --facts
    ///
    /// Examples: Item='{"Name":"Honda","Price":2300}', Limits='[1,2]'
    #[arg(value_name = "NAME=JSON")]
    facts: Vec<String>,
    /// JSON file with a top-level object, one fact per key
    #[arg(short = 'f', long = "facts", value_name = "FILE")]
    facts_file: Option<PathBuf>,
}

#[derive(Args)]
struct WorkspaceArgs {
    /// Workspace root directory containing .grl files
    #[arg(short = 'd', long = "dir", default_value = ".")]
    workdir: PathBuf,
    /// Maximum nesting depth of expressions in rule files
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ferrule=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run {
            rule_set,
            facts,
            workspace,
            max_cycles,
            raw,
        } => run_command(rule_set, facts, workspace, *max_cycles, *raw),
        Commands::Match {
            rule_set,
            facts,
            workspace,
        } => match_command(rule_set, facts, workspace),
        Commands::Show {
            rule_set,
            workspace,
        } => show_command(rule_set, workspace),
        Commands::List { root } => list_command(root),
    };

    if let Err(e) = result {
        if let Some(ferrule_err) = e.downcast_ref::<ferrule::FerruleError>() {
            eprintln!("{}", error_formatter::format_error(ferrule_err));
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run_command(
    rule_set: &str,
    fact_args: &FactArgs,
    workspace: &WorkspaceArgs,
    max_cycles: u64,
    raw: bool,
) -> Result<()> {
    let (library, _) = load_workspace(workspace)?;
    let mut kb = knowledge_base(&library, rule_set)?;
    let mut facts = load_facts(fact_args)?;

    let report = {
        let mut context = DataContext::new();
        for (name, value) in facts.iter_mut() {
            context.add(name.as_str(), value)?;
        }
        Engine::with_max_cycles(max_cycles).execute(&mut context, &mut kb)?
    };

    let formatter = Formatter::default();
    if raw {
        println!("{}", formatter.format_facts(&facts));
    } else {
        print!("{}", formatter.format_report(&report, &kb));
        println!("{}", formatter.format_facts(&facts));
    }
    Ok(())
}

fn match_command(rule_set: &str, fact_args: &FactArgs, workspace: &WorkspaceArgs) -> Result<()> {
    let (library, _) = load_workspace(workspace)?;
    let kb = knowledge_base(&library, rule_set)?;
    let mut facts = load_facts(fact_args)?;

    let mut context = DataContext::new();
    for (name, value) in facts.iter_mut() {
        context.add(name.as_str(), value)?;
    }
    let matching = Engine::new().fetch_matching_rules(&mut context, &kb)?;

    print!("{}", Formatter::default().format_matching(&matching));
    Ok(())
}

fn show_command(rule_set: &str, workspace: &WorkspaceArgs) -> Result<()> {
    let (library, _) = load_workspace(workspace)?;
    let kb = knowledge_base(&library, rule_set)?;
    print!("{}", Formatter::default().format_rule_set(kb.rule_set()));
    Ok(())
}

fn list_command(root: &Path) -> Result<()> {
    println!("Loading workspace from {}...", root.display());
    let (library, file_count) = load_workspace(&WorkspaceArgs {
        workdir: root.to_path_buf(),
        max_depth: None,
    })?;

    let stats: Vec<(String, usize)> = library
        .list()
        .into_iter()
        .filter_map(|(name, version)| {
            library
                .get(&name, &version)
                .map(|rule_set| (format!("{}@{}", name, version), rule_set.len()))
        })
        .collect();

    println!();
    print!(
        "{}",
        Formatter::default().format_workspace_summary(file_count, &stats)
    );
    Ok(())
}

/// Compile every .grl file under the workspace root
fn load_workspace(workspace: &WorkspaceArgs) -> Result<(KnowledgeLibrary, usize)> {
    let mut limits = ResourceLimits::default();
    if let Some(depth) = workspace.max_depth {
        limits.max_expression_depth = depth;
    }
    let mut library = KnowledgeLibrary::with_limits(limits);

    let mut file_count = 0;
    for entry in WalkDir::new(&workspace.workdir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("grl") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let (name, version) = split_rule_set_name(stem);
        let source =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let version = version.unwrap_or(DEFAULT_VERSION);
        library.compile(name, version, &source)?;
        tracing::debug!(rule_set = name, version, path = %path.display(), "compiled rule file");
        file_count += 1;
    }

    Ok((library, file_count))
}

/// Resolve `name` or `name@version` to a fresh knowledge base
fn knowledge_base(library: &KnowledgeLibrary, rule_set: &str) -> Result<KnowledgeBase> {
    let (name, version) = split_rule_set_name(rule_set);
    if let Some(version) = version {
        return Ok(library.new_knowledge_base(name, version)?);
    }

    let versions: Vec<String> = library
        .list()
        .into_iter()
        .filter(|(n, _)| n == name)
        .map(|(_, v)| v)
        .collect();
    match versions.as_slice() {
        [] => bail!("Rule set '{}' not found", name),
        [only] => Ok(library.new_knowledge_base(name, only)?),
        _ => bail!(
            "Rule set '{}' has several versions ({}); use {}@VERSION",
            name,
            versions.join(", "),
            name
        ),
    }
}

/// Split `pricing@1.2.0` into name and version
fn split_rule_set_name(input: &str) -> (&str, Option<&str>) {
    match input.split_once('@') {
        Some((name, version)) => (name, Some(version)),
        None => (input, None),
    }
}

/// Merge the facts file and `Name=<json>` arguments, later ones winning
fn load_facts(args: &FactArgs) -> Result<BTreeMap<String, serde_json::Value>> {
    let mut facts = BTreeMap::new();

    if let Some(path) = &args.facts_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read facts file {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        let serde_json::Value::Object(object) = value else {
            bail!(
                "facts file {} must contain a JSON object, one fact per key",
                path.display()
            );
        };
        facts.extend(object);
    }

    for arg in &args.facts {
        let (name, value) = parse_fact_arg(arg)?;
        facts.insert(name, value);
    }
    Ok(facts)
}

/// `Name=<json>`; a value that is not valid JSON is taken as a string
fn parse_fact_arg(arg: &str) -> Result<(String, serde_json::Value)> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid fact '{}', expected NAME=JSON", arg))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid fact '{}', name is empty", arg);
    }
    let value = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}
