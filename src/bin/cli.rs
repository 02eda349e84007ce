//! scholarscan CLI - scan scholarship PDFs for restrictive eligibility
//!
//! Usage: scholarscan-cli [OPTIONS] <COMMAND>
//!
//! Each scanned document appends one line to the scan log. Supports JSON
//! output for scripting.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use scholarscan_lib::classification::{build_classifier, Strategy};
use scholarscan_lib::phrases::PhraseMatcher;
use scholarscan_lib::scan_log::ScanLog;
use scholarscan_lib::scanner::scan_pdf;
use scholarscan_lib::settings::Settings;
use std::io::{BufRead, Read as _, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "scholarscan-cli")]
#[command(version, about = "Scholarship eligibility scanner", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (default: auto-detect)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan PDFs and append the results to the scan log
    Scan {
        /// PDF files (prompted for on stdin when omitted)
        paths: Vec<PathBuf>,
        /// Log file (default: settings log_file, scan_log.txt)
        #[arg(long)]
        log: Option<PathBuf>,
        /// Override the configured classifier
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },
    /// Classify raw text without logging
    Analyze {
        /// Text to classify (read from stdin when omitted)
        #[arg(long)]
        text: Option<String>,
        /// Override the configured classifier
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },
    /// List the configured restrictive phrases
    Phrases,
    /// Show the resolved settings file and effective settings
    Config,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    // println! panics on a closed pipe; exit quietly instead
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if info.to_string().contains("Broken pipe") {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<(), String> {
    if let Commands::Completions { shell } = &cli.command {
        generate(*shell, &mut Cli::command(), "scholarscan-cli", &mut std::io::stdout());
        return Ok(());
    }

    let (settings, config_path) = Settings::resolve(cli.config.as_deref()).map_err(|e| e.to_string())?;

    match cli.command {
        Commands::Scan { paths, log, strategy } => {
            let paths = if paths.is_empty() { vec![prompt_for_path()?] } else { paths };
            let log = ScanLog::new(log.unwrap_or_else(|| settings.log_file.clone()));
            run_scan(&settings, &paths, &log, strategy, cli.json).await
        }
        Commands::Analyze { text, strategy } => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .map_err(|e| format!("Failed to read stdin: {}", e))?;
                    buf
                }
            };
            let classifier = build_classifier(&settings, strategy.unwrap_or(settings.strategy))
                .map_err(|e| e.to_string())?;
            let result = classifier.classify(&text).await.map_err(|e| e.to_string())?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?);
            } else {
                println!("{}", result.status());
                if !result.matched.is_empty() {
                    println!("Matched: {}", result.matched.join(", "));
                }
                if let Some(confidence) = result.confidence {
                    println!("Confidence: {:.2}", confidence);
                }
                if let Some(reasoning) = &result.reasoning {
                    println!("Reasoning: {}", reasoning);
                }
            }
            Ok(())
        }
        Commands::Phrases => {
            let matcher = PhraseMatcher::new(&settings.phrases).map_err(|e| e.to_string())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(matcher.phrases()).map_err(|e| e.to_string())?);
            } else {
                for phrase in matcher.phrases() {
                    println!("{}", phrase);
                }
            }
            Ok(())
        }
        Commands::Config => {
            match &config_path {
                Some(p) => eprintln!("Settings file: {}", p.display()),
                None => eprintln!("Settings file: none (using defaults)"),
            }
            println!("{}", serde_json::to_string_pretty(&settings).map_err(|e| e.to_string())?);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

/// Ask for a single path on stdin
fn prompt_for_path() -> Result<PathBuf, String> {
    print!("Enter the path to the PDF file: ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read path: {}", e))?;

    let path = line.trim();
    if path.is_empty() {
        return Err("No path given".to_string());
    }
    Ok(PathBuf::from(path))
}

async fn run_scan(
    settings: &Settings,
    paths: &[PathBuf],
    log: &ScanLog,
    strategy: Option<Strategy>,
    json: bool,
) -> Result<(), String> {
    let classifier = build_classifier(settings, strategy.unwrap_or(settings.strategy))
        .map_err(|e| e.to_string())?;

    let mut failures = 0usize;
    let mut outcomes = Vec::new();

    for path in paths {
        match scan_pdf(path, classifier.as_ref(), log).await {
            Ok(outcome) => {
                if !json {
                    println!("Log updated: {}", outcome.entry);
                }
                outcomes.push(outcome);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                failures += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes).map_err(|e| e.to_string())?);
    }

    if failures > 0 {
        return Err(format!("{} of {} documents failed", failures, paths.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_defaults() {
        let args = Cli::try_parse_from(["scholarscan-cli", "scan", "a.pdf", "b.pdf"]).unwrap();
        if let Commands::Scan { paths, log, strategy } = args.command {
            assert_eq!(paths, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
            assert!(log.is_none());
            assert!(strategy.is_none());
        } else {
            panic!("Expected Scan command");
        }
    }

    #[test]
    fn test_parse_scan_strategy_alias() {
        let args = Cli::try_parse_from([
            "scholarscan-cli", "--json", "scan", "--strategy", "delegated", "--log", "out.txt",
        ])
        .unwrap();
        assert!(args.json);
        if let Commands::Scan { paths, log, strategy } = args.command {
            assert!(paths.is_empty());
            assert_eq!(log, Some(PathBuf::from("out.txt")));
            assert_eq!(strategy, Some(Strategy::Model));
        } else {
            panic!("Expected Scan command");
        }
    }

    #[test]
    fn test_parse_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["scholarscan-cli", "scan", "--strategy", "regex"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
