//! nudge - command-line tool for trigger rules.
//!
//! # Configuration
//!
//! Pass `--config <file>` (TOML, JSON or YAML) or rely on the environment:
//!
//! - `NUDGE_STORE_PATH` - rule store, defaults to `~/.nudge/rules.db`
//! - `NUDGE_LLM_PROVIDER` - `openrouter` (default), `openai` or `anthropic`
//! - `OPENROUTER_API_KEY` / `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`
//! - `NUDGE_USER`, `NUDGE_ROLE` - principal used for writes
//!
//! Logs go to stderr; `RUST_LOG` controls the filter.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nudge_core::rule::normalize_rule_id;
use nudge_core::{
    describe_rule, select_firing, NudgeConfig, Principal, Role, RuleGenerator, RuleStore,
    RuleWorkspace, SqliteRuleStore, TriggerRule, VariableSnapshot,
};
use nudge_llm::LlmFactory;

#[derive(Debug, Parser)]
#[command(name = "nudge")]
#[command(version, about = "Validate, generate and store trigger rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "NUDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Validate a rule or an array of rules
    Validate {
        /// JSON file holding one rule or an array
        rules: PathBuf,
    },

    /// Describe each rule in plain English
    Summarize { rules: PathBuf },

    /// Derive a free rule id
    NormalizeId {
        base: String,

        /// Ids already taken
        existing: Vec<String>,
    },

    /// Generate a rule with the configured LLM
    Generate {
        /// Natural-language description of the rule
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Save the generated rule to the store
        #[arg(long)]
        save: bool,
    },

    /// Validate and save rules to the store
    Import { rules: PathBuf },

    /// List stored rules
    List,

    /// Delete a stored rule
    Delete { rule_id: String },

    /// Show which rules would fire now
    Evaluate {
        /// JSON object of variable values
        snapshot: PathBuf,

        /// Rules file; defaults to the store
        rules: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<NudgeConfig> {
    let config = match path {
        Some(path) => {
            let mut config = NudgeConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => NudgeConfig::from_env()?,
    };
    Ok(config)
}

/// Principal for writes, from an environment lookup.
fn principal_from(get: impl Fn(&str) -> Option<String>) -> Result<Principal> {
    let user = get("NUDGE_USER").unwrap_or_else(|| "cli".to_string());
    let role = match get("NUDGE_ROLE") {
        Some(raw) if !raw.trim().is_empty() => Some(
            Role::from_str(raw.trim()).with_context(|| format!("invalid NUDGE_ROLE '{}'", raw))?,
        ),
        _ => None,
    };
    Ok(Principal::new(user, role))
}

/// Rules from a file holding either one rule or an array of rules.
fn read_rules(path: &Path) -> Result<Vec<TriggerRule>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not JSON", path.display()))?;
    let rules = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(rules)
}

fn open_workspace(config: &NudgeConfig) -> Result<RuleWorkspace<SqliteRuleStore>> {
    let store = SqliteRuleStore::new(&config.store_path)
        .with_context(|| format!("failed to open {}", config.store_path.display()))?;
    Ok(RuleWorkspace::new(store, config.validation.validator()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { rules: path } => {
            let rules = read_rules(&path)?;
            let report = config.validation.validator().validate_collection(&rules);
            print_json(&report)?;
            if !report.is_valid() {
                bail!("{} validation error(s)", report.errors.len());
            }
        }
        Commands::Summarize { rules: path } => {
            let summaries: Vec<String> = read_rules(&path)?.iter().map(describe_rule).collect();
            println!("{}", summaries.join("\n\n"));
        }
        Commands::NormalizeId { base, existing } => {
            let existing: HashSet<String> = existing.into_iter().collect();
            println!("{}", normalize_rule_id(&base, &existing));
        }
        Commands::Generate { prompt, save } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                bail!("generate needs a non-empty prompt");
            }
            let llm = LlmFactory::from_config(&config.llm)?;
            let generator = RuleGenerator::new(llm)
                .with_validator(config.validation.validator())
                .with_options(config.llm.config.generation_options())
                .with_timeout(config.generation.timeout());
            let generated = generator.generate(&prompt).await?;
            for warning in &generated.warnings {
                tracing::warn!("{}", warning);
            }

            if save {
                let principal = principal_from(|key| std::env::var(key).ok())?;
                let workspace = open_workspace(&config)?;
                workspace.load().await?;
                let accepted = workspace.accept_generated(generated.rule)?;
                workspace.save_rule(&principal, &accepted.id).await?;
                print_json(&accepted)?;
            } else {
                print_json(&generated.rule)?;
            }
        }
        Commands::Import { rules: path } => {
            let rules = read_rules(&path)?;
            config
                .validation
                .validator()
                .validate_collection(&rules)
                .into_result()?;

            let principal = principal_from(|key| std::env::var(key).ok())?;
            let workspace = open_workspace(&config)?;
            workspace.load().await?;
            for rule in rules {
                let id = rule.id.clone();
                if workspace.get(&id).is_some() {
                    workspace.update_rule(&id, rule)?;
                } else {
                    workspace.insert_rule(rule);
                }
                workspace.save_rule(&principal, &id).await?;
                println!("saved {}", id);
            }
        }
        Commands::List => {
            let workspace = open_workspace(&config)?;
            for row in workspace.store().list().await? {
                let flag = if row.enabled { "on " } else { "off" };
                println!("{} {} {}  {}", flag, row.rule_id, row.updated_at.to_rfc3339(), row.name);
            }
        }
        Commands::Delete { rule_id: id } => {
            let principal = principal_from(|key| std::env::var(key).ok())?;
            let workspace = open_workspace(&config)?;
            workspace.load().await?;
            workspace.delete_rule(&principal, &id).await?;
            println!("deleted {}", id);
        }
        Commands::Evaluate { snapshot, rules } => {
            let content = std::fs::read_to_string(&snapshot)
                .with_context(|| format!("failed to read {}", snapshot.display()))?;
            let now = chrono::Local::now();
            let mut values = VariableSnapshot::at(&now);
            values.extend(serde_json::from_str(&content)?);

            let rules = match rules {
                Some(path) => read_rules(&path)?,
                None => {
                    let workspace = open_workspace(&config)?;
                    workspace.load().await?
                }
            };
            for rule in select_firing(&rules, &values, &now, &HashMap::new()) {
                println!("{} (priority {})", rule.id, rule.priority);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    run(cli).await.inspect_err(|e| {
        tracing::error!("{:#}", e);
    })
}
