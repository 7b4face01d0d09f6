//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimizuku_core::{AxiomLoader, FunctionalSyntaxLoader};
use mimizuku_engine::{dump_roles, dump_subsumptions, Classifier, ClassifierConfig, EngineError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "mimizuku")]
#[command(about = "EL ontology classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify an ontology and print its taxonomy
    Classify {
        /// Ontology in functional-style syntax
        #[arg(short, long)]
        input: PathBuf,

        /// Classifier configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Saturate with parallel workers
        #[arg(long)]
        parallel: bool,

        /// Worker count for --parallel
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output file for the taxonomy
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Query the last classification (or classify --input first)
    Query {
        /// Ontology to classify before querying
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Class name
        #[arg(long)]
        class: Option<String>,

        /// Object property name
        #[arg(long)]
        property: Option<String>,

        /// Individual name
        #[arg(long)]
        individual: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Dump derived facts of the last classification
    Dump {
        /// Ontology to classify before dumping
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Relation to dump
        #[arg(short, long, default_value = "subsumptions")]
        relation: Relation,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show system information
    Info,
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

/// Dumpable relations
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum Relation {
    /// Tab-delimited subsumption pairs
    Subsumptions,
    /// Role facts as triples
    Roles,
}

/// Command execution result
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Execute CLI commands; the last classifier is kept for later queries
pub struct CommandExecutor {
    classifier: Option<Classifier>,
}

fn load(input: &Path, config: ClassifierConfig) -> Result<Classifier> {
    let ontology = FunctionalSyntaxLoader
        .load_file(input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    info!(axioms = ontology.axioms.len(), "loaded {}", input.display());
    Ok(Classifier::new(ontology, config))
}

fn emit(result: &str, output: Option<PathBuf>) -> Result<()> {
    if let Some(output_path) = output {
        std::fs::write(&output_path, result)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
    } else {
        println!("{}", result);
    }
    Ok(())
}

fn render(value: &serde_json::Value, text: String, format: &OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => text,
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    })
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self { classifier: None }
    }

    /// Classifier of the last `classify`, if any
    pub fn classifier(&self) -> Option<&Classifier> {
        self.classifier.as_ref()
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Classify { input, config, parallel, workers, output, format } => {
                self.execute_classify(input, config, parallel, workers, output, format).await
            }
            Commands::Query { input, class, property, individual, format } => {
                self.execute_query(input, class, property, individual, format)
            }
            Commands::Dump { input, relation, output } => self.execute_dump(input, relation, output),
            Commands::Info => self.execute_info(),
        }
    }

    async fn execute_classify(
        &mut self,
        input: PathBuf,
        config: Option<PathBuf>,
        parallel: bool,
        workers: Option<usize>,
        output: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let mut classifier_config = match config {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                ClassifierConfig::from_json(&content)?
            }
            None => ClassifierConfig::default(),
        };
        if let Some(workers) = workers {
            classifier_config = classifier_config.with_workers(workers);
        }

        let mut classifier = load(&input, classifier_config)?;
        if parallel {
            classifier.classify_concurrent().await?;
        } else {
            classifier.classify()?;
        }

        let report = classifier.report()?;
        let result = match format {
            OutputFormat::Text => report.to_string(),
            OutputFormat::Json => report.to_json(false)?,
            OutputFormat::JsonPretty => report.to_json(true)?,
        };
        emit(&result, output)?;

        let message = if report.consistent {
            format!("Classified {} classes", report.classes.len())
        } else {
            "Ontology is inconsistent".to_string()
        };
        let data = serde_json::json!({
            "consistent": report.consistent,
            "classes": report.classes.len(),
            "properties": report.properties.len(),
            "stats": report.stats,
        });
        self.classifier = Some(classifier);

        Ok(CommandResult {
            success: true,
            message,
            data: Some(data),
        })
    }

    /// Classify `input` if given, else fall back to the last classifier
    fn classified(&mut self, input: Option<PathBuf>) -> Result<&Classifier> {
        if let Some(path) = input {
            let mut classifier = load(&path, ClassifierConfig::default())?;
            classifier.classify()?;
            self.classifier = Some(classifier);
        }
        let classifier = self.classifier.as_ref().ok_or(EngineError::NotClassified)?;
        Ok(classifier)
    }

    fn execute_query(
        &mut self,
        input: Option<PathBuf>,
        class: Option<String>,
        property: Option<String>,
        individual: Option<String>,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let classifier = self.classified(input)?;

        let (value, text) = if let Some(name) = class {
            let value = serde_json::json!({
                "class": name,
                "parents": classifier.super_classes(&name)?,
                "children": classifier.sub_classes(&name)?,
                "equivalents": classifier.equivalent_classes(&name)?,
                "ancestors": classifier.ancestors(&name)?,
            });
            let text = format!(
                "{}\n  parents: {}\n  children: {}\n  equivalents: {}\n  ancestors: {}",
                name,
                classifier.super_classes(&name)?.join(", "),
                classifier.sub_classes(&name)?.join(", "),
                classifier.equivalent_classes(&name)?.join(", "),
                classifier.ancestors(&name)?.join(", "),
            );
            (value, text)
        } else if let Some(name) = property {
            let value = serde_json::json!({
                "property": name,
                "parents": classifier.super_roles(&name)?,
                "children": classifier.sub_roles(&name)?,
            });
            let text = format!(
                "{}\n  parents: {}\n  children: {}",
                name,
                classifier.super_roles(&name)?.join(", "),
                classifier.sub_roles(&name)?.join(", "),
            );
            (value, text)
        } else if let Some(name) = individual {
            let value = serde_json::json!({
                "individual": name,
                "types": classifier.direct_types(&name)?,
                "same_as": classifier.same_individuals(&name)?,
            });
            let text = format!(
                "{}\n  types: {}\n  same as: {}",
                name,
                classifier.direct_types(&name)?.join(", "),
                classifier.same_individuals(&name)?.join(", "),
            );
            (value, text)
        } else {
            return Err(anyhow::anyhow!("One of --class, --property or --individual must be specified"));
        };

        println!("{}", render(&value, text, &format)?);

        Ok(CommandResult {
            success: true,
            message: "Query answered".to_string(),
            data: Some(value),
        })
    }

    fn execute_dump(
        &mut self,
        input: Option<PathBuf>,
        relation: Relation,
        output: Option<PathBuf>,
    ) -> Result<CommandResult> {
        let classifier = self.classified(input)?;
        let entities = &classifier.ontology().entities;
        let store = classifier.store()?;

        let result = match relation {
            Relation::Subsumptions => dump_subsumptions(entities, store),
            Relation::Roles => dump_roles(entities, store),
        };
        let lines = result.lines().count();
        emit(result.trim_end(), output)?;

        Ok(CommandResult {
            success: true,
            message: format!("Dumped {} facts", lines),
            data: Some(serde_json::json!({ "facts": lines })),
        })
    }

    fn execute_info(&self) -> Result<CommandResult> {
        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "repository": env!("CARGO_PKG_REPOSITORY"),
            "features": ["el-saturation", "extended-nodes", "nominal-closure", "parallel-workers", "cli"]
        });

        let result = serde_json::to_string_pretty(&info)?;
        println!("{}", result);

        Ok(CommandResult {
            success: true,
            message: "System information".to_string(),
            data: Some(info),
        })
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}
