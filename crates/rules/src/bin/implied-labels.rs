//! implied-labels: command-line front end for the implication engine.
//!
//! Reads and writes the implications file named by `--rules-file` /
//! `IMPLIED_RULES_FILE` and answers per-node questions against it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;

use implied_core::config::{load_dotenv, Config};
use implied_core::{LabelSet, Node};
use implied_rules::{
    ExpressionCheck, ImplicationStore, ImpliedLabels, LabelSources, RuleSpec, StaticLabels,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Derive node labels from declared labels and implication rules.
#[derive(Parser, Debug)]
#[command(name = "implied-labels", version, about)]
struct Cli {
    /// Path to the implications YAML file.
    #[arg(long, env = "IMPLIED_RULES_FILE", global = true)]
    rules_file: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a label expression.
    Check { expression: String },

    /// Print the active implications in evaluation order.
    List,

    /// Replace all implications; each rule as "<expression> => <atoms>".
    Set {
        #[arg(long = "rule", value_name = "RULE")]
        rules: Vec<RuleSpec>,
    },

    /// Print every label of a node, implied ones included.
    Evaluate(NodeArgs),

    /// Print declared labels the implications derive anyway.
    Redundant(NodeArgs),

    /// Print the labels implied by a label string, excluding the string's own labels.
    Infer { labels: String },

    /// Print the effective configuration.
    Config,

    /// Reload the implications file on every change until interrupted.
    Watch,
}

#[derive(clap::Args, Debug)]
struct NodeArgs {
    /// Node name; also the node's self label.
    #[arg(long)]
    node: Option<String>,

    /// Labels declared on the node.
    #[arg(long, default_value = "")]
    labels: String,

    /// Labels contributed by other discoverers.
    #[arg(long, default_value = "")]
    contributed: String,
}

// ── Output ──────────────────────────────────────────────────────────

fn print_labels(labels: &LabelSet, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(labels)?);
    } else {
        println!("{}", labels);
    }
    Ok(())
}

fn open(rules_file: PathBuf, contributed: &str) -> anyhow::Result<ImpliedLabels> {
    let mut sources = LabelSources::new();
    let contributed = LabelSet::parse(contributed);
    if !contributed.is_empty() {
        sources.register(Box::new(StaticLabels::everywhere("command-line", contributed)));
    }
    Ok(ImpliedLabels::open(ImplicationStore::new(rules_file), sources)?)
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let rules_file = cli
        .rules_file
        .clone()
        .unwrap_or_else(|| config.rules.rules_file.clone());

    match cli.command {
        Command::Check { expression } => match implied_rules::check_expression(&expression) {
            ExpressionCheck::Ok => println!("ok"),
            ExpressionCheck::Error(message) => bail!(message),
        },
        Command::List => {
            let engine = open(rules_file, "")?;
            let specs: Vec<RuleSpec> = engine.implications().iter().map(|r| r.to_spec()).collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&specs)?);
            } else {
                for rule in engine.implications().iter() {
                    println!("{}", rule);
                }
            }
        }
        Command::Set { rules } => {
            let engine = open(rules_file, "")?;
            engine.submit(&rules)?;
            info!(rules = rules.len(), "implications replaced");
            for rule in engine.implications().iter() {
                println!("{}", rule);
            }
        }
        Command::Evaluate(args) => {
            let engine = open(rules_file, &args.contributed)?;
            let node = Node::new(args.node.unwrap_or(config.node.self_label), args.labels);
            print_labels(&engine.evaluate(&node), cli.json)?;
        }
        Command::Redundant(args) => {
            let engine = open(rules_file, &args.contributed)?;
            let node = Node::new(args.node.unwrap_or(config.node.self_label), args.labels);
            print_labels(&engine.redundant_labels(&node), cli.json)?;
        }
        Command::Infer { labels } => {
            let engine = open(rules_file, "")?;
            let inferred = engine.preview(&labels);
            if inferred.is_empty() && !cli.json {
                println!("No labels inferred");
            } else {
                print_labels(&inferred, cli.json)?;
            }
        }
        Command::Config => {
            let mut summary = config.summary();
            summary["rules"]["file"] = serde_json::json!(rules_file);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Watch => {
            let mut engine = open(rules_file, "")?;
            engine.watch()?;
            loop {
                std::thread::sleep(Duration::from_secs(60));
                let stats = engine.stats();
                info!(
                    generation = stats.generation,
                    rules = engine.implications().len(),
                    "implications watcher alive"
                );
            }
        }
    }

    Ok(())
}
