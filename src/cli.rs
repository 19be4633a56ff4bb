use crate::config::settings::VerifierSettings;
use crate::config::types::{CaseOutcome, VerificationReport};
use crate::judge::registry::{adapter_for, supported_languages};
use crate::judge::LanguageAdapter;
use crate::literal;
use crate::observability::metrics::get_metrics;
use crate::verdict::ListOrder;
use crate::verify::{RawTestCase, Verifier};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a candidate solution against test cases
    Verify {
        /// Language slug (python3, javascript, typescript) or alias
        #[arg(long)]
        language: String,
        /// Path to the candidate source file
        #[arg(long)]
        source: PathBuf,
        /// JSON file with an array of {"input": ..., "expected": ...}
        #[arg(long)]
        cases: PathBuf,
        /// Per-case wall clock limit in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Settings file (overrides SOLVEBOX_CONFIG and the search path)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Compare lists as multisets
        #[arg(long)]
        unordered: bool,
        /// Print Prometheus metrics to stderr after the report
        #[arg(long)]
        metrics: bool,
    },
    /// Check that language toolchains are installed
    CheckDeps {
        /// Show toolchain versions
        #[arg(long, short)]
        verbose: bool,
    },
    /// List supported languages
    Languages,
    /// Parse literal notation and print its canonical form
    Parse {
        literal: String,
        /// Treat the text as `name = value` assignments
        #[arg(long)]
        assignments: bool,
    },
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Verify {
            language,
            source,
            cases,
            timeout_ms,
            config,
            json,
            unordered,
            metrics,
        } => {
            let mut settings = VerifierSettings::load(config.as_deref())?;
            if let Some(ms) = timeout_ms {
                settings.execution_timeout_ms = ms;
            }
            if unordered {
                settings.list_order = ListOrder::Unordered;
            }

            let code = std::fs::read_to_string(&source)
                .with_context(|| format!("failed to read source {}", source.display()))?;
            let raw_cases = read_cases(&cases)?;

            let verifier = Verifier::from_settings(settings)?;
            let report = verifier.verify(&code, &language, &raw_cases)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, &raw_cases);
            }
            if metrics {
                eprint!("{}", get_metrics().export_prometheus());
            }

            if !report.all_passed() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::CheckDeps { verbose } => check_language_dependencies(verbose),
        Commands::Languages => {
            for info in supported_languages() {
                println!(
                    "{:<12} {:<12} .{:<4} aliases: {}",
                    info.slug,
                    info.display_name,
                    info.extension,
                    info.aliases.join(", ")
                );
            }
            Ok(())
        }
        Commands::Parse {
            literal: text,
            assignments,
        } => {
            if assignments {
                let inputs = literal::parse_assignments(&text)?;
                println!("{}", inputs);
            } else {
                let value = literal::parse(&text)?;
                println!("{} ({})", value, value.type_name());
            }
            Ok(())
        }
    }
}

fn read_cases(path: &Path) -> Result<Vec<RawTestCase>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cases {}", path.display()))?;
    let cases: Vec<RawTestCase> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse cases {}", path.display()))?;
    if cases.is_empty() {
        log::warn!("{} contains no test cases", path.display());
    }
    Ok(cases)
}

fn print_report(report: &VerificationReport, cases: &[RawTestCase]) {
    if let Some(failure) = &report.failure {
        println!("❌ {} solution rejected: {}", report.language, failure);
        return;
    }

    if let Some(signature) = &report.signature {
        match &signature.container {
            Some(class) => println!(
                "Callable: {}.{}({})",
                class,
                signature.name,
                signature.parameter_names.join(", ")
            ),
            None => println!(
                "Callable: {}({})",
                signature.name,
                signature.parameter_names.join(", ")
            ),
        }
    }

    // Deduplicated runs have fewer outcomes than cases; inputs no longer line up.
    let aligned = report.outcomes.len() == cases.len();
    for (index, outcome) in report.outcomes.iter().enumerate() {
        let input = cases
            .get(index)
            .filter(|_| aligned)
            .map(|c| c.input.replace('\n', "; "))
            .unwrap_or_else(|| "-".to_string());
        match outcome {
            CaseOutcome::Passed => println!("✅ case {}: passed", index),
            CaseOutcome::Mismatch { actual, expected } => {
                println!("❌ case {}: wrong answer", index);
                println!("   input:    {}", input);
                println!("   expected: {}", expected);
                println!("   actual:   {}", actual);
            }
            CaseOutcome::RuntimeFailure { message } => {
                println!("❌ case {}: runtime error", index);
                println!("   input:    {}", input);
                println!("   error:    {}", message);
            }
            CaseOutcome::Timeout { limit_millis } => {
                println!("⏱️ case {}: timed out after {} ms", index, limit_millis);
                println!("   input:    {}", input);
            }
        }
    }

    println!();
    println!(
        "{}/{} case(s) passed",
        report.passed_count, report.total_count
    );
}

fn check_language_dependencies(verbose: bool) -> Result<()> {
    println!("🔍 Checking language toolchains...");
    println!();

    let settings = VerifierSettings::load_default()?;
    let mut missing = Vec::new();

    for info in supported_languages() {
        let adapter = adapter_for(info.slug, &settings)?;
        if adapter.runtime_available() {
            println!("✅ {} - OK", info.display_name);
        } else {
            println!("❌ {} - MISSING", info.display_name);
            missing.push(info.display_name);
        }
        if verbose {
            for line in toolchain_versions(&*adapter) {
                println!("{}", line);
            }
            println!();
        }
    }

    println!();
    if missing.is_empty() {
        println!("🎉 All language toolchains are installed!");
        Ok(())
    } else {
        println!("⚠️  Missing toolchains: {}", missing.join(", "));
        std::process::exit(1);
    }
}

/// First line of `--version` for every program the adapter launches
fn toolchain_versions(adapter: &dyn LanguageAdapter) -> Vec<String> {
    use std::process::Command;

    adapter
        .toolchain()
        .into_iter()
        .map(|program| match Command::new(&program).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let text = if !output.stdout.is_empty() {
                    String::from_utf8_lossy(&output.stdout)
                } else {
                    String::from_utf8_lossy(&output.stderr)
                };
                let version = text.lines().next().unwrap_or("").trim().to_string();
                format!("  {} -> {}", program, version)
            }
            Ok(_) => format!("  {} -> FAILED", program),
            Err(_) => format!("  {} -> NOT FOUND", program),
        })
        .collect()
}
