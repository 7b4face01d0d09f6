//! Tests for the mimizuku-cli crate

use clap::Parser;
use mimizuku_cli::commands::{Cli, CommandExecutor, Commands, OutputFormat, Relation};
use mimizuku_cli::interactive::InteractiveSession;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const PIZZA: &str = r#"
# toppings
SubClassOf(Margherita Pizza)
SubClassOf(Margherita ObjectSomeValuesFrom(hasTopping Mozzarella))
SubClassOf(Mozzarella Cheese)
SubClassOf(ObjectSomeValuesFrom(hasTopping Cheese) CheesyPizza)
SubObjectPropertyOf(hasTopping hasIngredient)
ClassAssertion(Margherita myPizza)
"#;

fn ontology_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_cli_parsing_info() {
    let cli = Cli::try_parse_from(["mimizuku", "info"]).unwrap();
    assert!(matches!(cli.command, Commands::Info));
}

#[test]
fn test_cli_parsing_classify() {
    let args = ["mimizuku", "classify", "--input", "pizza.ofn", "--parallel", "--workers", "8", "--format", "json-pretty"];
    let cli = Cli::try_parse_from(args).unwrap();

    match cli.command {
        Commands::Classify { input, config, parallel, workers, output, format } => {
            assert_eq!(input, PathBuf::from("pizza.ofn"));
            assert_eq!(config, None);
            assert!(parallel);
            assert_eq!(workers, Some(8));
            assert_eq!(output, None);
            assert_eq!(format, OutputFormat::JsonPretty);
        }
        _ => panic!("Expected Classify command"),
    }
}

#[test]
fn test_cli_parsing_dump_defaults() {
    let cli = Cli::try_parse_from(["mimizuku", "dump"]).unwrap();

    match cli.command {
        Commands::Dump { input, relation, output } => {
            assert_eq!(input, None);
            assert_eq!(relation, Relation::Subsumptions);
            assert_eq!(output, None);
        }
        _ => panic!("Expected Dump command"),
    }
}

#[test]
fn test_cli_rejects_unknown_format() {
    assert!(Cli::try_parse_from(["mimizuku", "classify", "--input", "a.ofn", "--format", "xml"]).is_err());
}

#[tokio::test]
async fn test_classify_then_query() {
    let file = ontology_file(PIZZA);
    let mut executor = CommandExecutor::new();

    let result = executor
        .execute(Commands::Classify {
            input: file.path().to_path_buf(),
            config: None,
            parallel: false,
            workers: None,
            output: None,
            format: OutputFormat::Text,
        })
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.data.unwrap()["consistent"], true);

    let result = executor
        .execute(Commands::Query {
            input: None,
            class: Some("Margherita".to_string()),
            property: None,
            individual: None,
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    let data = result.data.unwrap();
    let parents: Vec<String> = serde_json::from_value(data["parents"].clone()).unwrap();
    assert_eq!(parents, vec!["Pizza", "CheesyPizza"]);

    let result = executor
        .execute(Commands::Query {
            input: None,
            class: None,
            property: None,
            individual: Some("myPizza".to_string()),
            format: OutputFormat::Text,
        })
        .await
        .unwrap();
    assert_eq!(result.data.unwrap()["types"], serde_json::json!(["Margherita"]));
}

#[tokio::test]
async fn test_parallel_classify_with_config_file() {
    let file = ontology_file(PIZZA);
    let config = ontology_file(r#"{"queue_policy": "alternating", "workers": 2}"#);
    let output = NamedTempFile::new().unwrap();
    let mut executor = CommandExecutor::new();

    executor
        .execute(Commands::Classify {
            input: file.path().to_path_buf(),
            config: Some(config.path().to_path_buf()),
            parallel: true,
            workers: None,
            output: Some(output.path().to_path_buf()),
            format: OutputFormat::Json,
        })
        .await
        .unwrap();

    let written = std::fs::read_to_string(output.path()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(report["consistent"], true);
    assert_eq!(report["stats"]["workers"], 2);
    assert!(executor.classifier().unwrap().is_classified());
}

#[tokio::test]
async fn test_query_without_classification_fails() {
    let mut executor = CommandExecutor::new();
    let result = executor
        .execute(Commands::Query {
            input: None,
            class: Some("Pizza".to_string()),
            property: None,
            individual: None,
            format: OutputFormat::Text,
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_dump_roles() {
    let file = ontology_file("ObjectPropertyAssertion(knows alice bob)\n");
    let output = NamedTempFile::new().unwrap();
    let mut executor = CommandExecutor::new();

    let result = executor
        .execute(Commands::Dump {
            input: Some(file.path().to_path_buf()),
            relation: Relation::Roles,
            output: Some(output.path().to_path_buf()),
        })
        .await
        .unwrap();

    assert_eq!(result.data.unwrap()["facts"], 1);
    assert_eq!(std::fs::read_to_string(output.path()).unwrap(), "{alice} knows {bob} .");
}

#[tokio::test]
async fn test_interactive_lines_share_the_classifier() {
    let file = ontology_file(PIZZA);
    let mut session = InteractiveSession::new();

    let line = format!("classify --input '{}'", file.path().display());
    session.execute_line(&line).await.unwrap();
    session.execute_line("query --property hasTopping").await.unwrap();

    assert!(session.executor().classifier().unwrap().is_classified());
}
