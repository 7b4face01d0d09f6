//! Interactive CLI mode
//!
//! The executor is shared across lines, so `query` and `dump` answer from the
//! last `classify`.

use crate::commands::{Cli, CommandExecutor};
use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};

/// Interactive CLI session
pub struct InteractiveSession {
    executor: CommandExecutor,
}

impl InteractiveSession {
    pub fn new() -> Self {
        Self {
            executor: CommandExecutor::new(),
        }
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Start interactive session
    pub async fn run(&mut self) -> Result<()> {
        println!("Welcome to Mimizuku Interactive Mode");
        println!("Type 'help' for available commands, 'quit' to exit");
        println!("{}", "=".repeat(50));

        let stdin = io::stdin();
        loop {
            print!("mimizuku> ");
            io::stdout().flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            match input {
                "quit" | "exit" | "q" => {
                    println!("Goodbye!");
                    break;
                }
                "help" | "h" => self.show_help(),
                "clear" => print!("\x1B[2J\x1B[1;1H"),
                _ => {
                    if let Err(e) = self.execute_line(input).await {
                        eprintln!("Error: {}", e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse one line as CLI arguments and run it
    pub async fn execute_line(&mut self, input: &str) -> Result<()> {
        let mut args = vec!["mimizuku".to_string()];
        args.extend(shell_words::split(input)?);
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) => {
                eprintln!("Parse error: {}", e);
                return Ok(());
            }
        };

        let result = self.executor.execute(cli.command).await?;
        if !result.message.is_empty() {
            println!("{}", result.message);
        }
        Ok(())
    }

    fn show_help(&self) {
        println!("Available commands:");
        println!("  classify --input <file> [options]   Classify an ontology");
        println!("  query --class|--property|--individual <name>");
        println!("                                      Query the last classification");
        println!("  dump --relation subsumptions|roles  Dump derived facts");
        println!("  info                                Show system information");
        println!("  help                                Show this help");
        println!("  clear                               Clear screen");
        println!("  quit                                Exit interactive mode");
        println!();
        println!("Use '<command> --help' for detailed help on each command");
    }
}

impl Default for InteractiveSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Start interactive mode
pub async fn start_interactive() -> Result<()> {
    let mut session = InteractiveSession::new();
    session.run().await
}
