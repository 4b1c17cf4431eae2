//! cryptosentinel-cli - scriptable front end to the analysis service
//!
//! Runs one analysis session per invocation and prints the scored metrics.
//! Optionally asks follow-up questions and answers the trade prompt.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cryptosentinel_core::format::format_relative_time;
use cryptosentinel_core::{
    present, Config, Decision, FollowupAnswer, HttpSentinelClient, Phase, SentinelService,
    Session, SummaryView,
};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "cryptosentinel-cli")]
#[command(about = "Analyze crypto tokens from the command line")]
#[command(version)]
struct Args {
    /// Verbose output (session id and service URL on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a token address
    Analyze {
        /// Contract address or token name
        address: String,

        /// Answer the trade prompt (yes or no)
        #[arg(short, long)]
        decide: Option<Decision>,

        /// Follow-up question to ask after the analysis (repeatable)
        #[arg(short, long = "ask")]
        questions: Vec<String>,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Check whether the analysis service is up
    Health,
    /// Show the effective configuration
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard = cryptosentinel_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    match args.command {
        Command::Analyze {
            address,
            decide,
            questions,
            format,
        } => {
            let client = HttpSentinelClient::new(&config.service)
                .context("failed to create service client")?;
            run_analysis(&client, &address, decide, &questions, &format, args.verbose)
        }
        Command::Health => {
            let client = HttpSentinelClient::new(&config.service)
                .context("failed to create service client")?;
            if client.health_check()? {
                println!("Service at {} is healthy", client.base_url());
                Ok(())
            } else {
                anyhow::bail!("service at {} is not healthy", client.base_url())
            }
        }
        Command::Config => {
            print_config(&config);
            Ok(())
        }
    }
}

fn run_analysis(
    client: &dyn SentinelService,
    address: &str,
    decide: Option<Decision>,
    questions: &[String],
    format: &str,
    verbose: bool,
) -> Result<()> {
    if format != "text" && format != "json" {
        anyhow::bail!("unknown output format '{}' (expected text or json)", format);
    }

    let mut session = Session::new();
    if verbose {
        eprintln!("Session: {}", session.token());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid progress template")?,
    );
    pb.set_message(format!("Analyzing {}...", address.trim()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let submitted = session.submit(address, client);
    pb.finish_and_clear();
    submitted.context("analysis request rejected")?;

    if session.phase() == Phase::AnalysisFailed {
        anyhow::bail!(
            "analysis failed: {}",
            session.analysis_error().unwrap_or("unknown error")
        );
    }

    for question in questions {
        session
            .ask_followup(question, client)
            .with_context(|| format!("failed to ask follow-up {:?}", question))?;
    }

    let offered = session.can_decide();
    if let Some(decision) = decide {
        if offered {
            session.decide(decision, client)?;
        }
    }

    let Some(payload) = session.analysis() else {
        anyhow::bail!("analysis finished without a result");
    };
    let summary = present(payload);

    if format == "json" {
        let followups: Vec<_> = session
            .followups()
            .iter()
            .map(|entry| {
                let (answer, error) = match &entry.answer {
                    FollowupAnswer::Answered(text) => (Some(text.as_str()), None),
                    FollowupAnswer::Failed(reason) => (None, Some(reason.as_str())),
                    FollowupAnswer::Pending => (None, None),
                };
                serde_json::json!({
                    "question": entry.question,
                    "answer": answer,
                    "error": error,
                })
            })
            .collect();
        let output = serde_json::json!({
            "session_id": session.token(),
            "analysis": payload,
            "followups": followups,
            "decision": session.decision(),
            "outcome": session.decision_outcome(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_summary(&summary, payload.result.timestamp);

    for entry in session.followups() {
        println!();
        println!("Q: {}", entry.question);
        match &entry.answer {
            FollowupAnswer::Answered(text) => println!("A: {}", text),
            FollowupAnswer::Failed(reason) => println!("A: (failed) {}", reason),
            FollowupAnswer::Pending => println!("A: (no answer)"),
        }
    }

    println!();
    match (decide, session.decision_outcome()) {
        (_, Some(outcome)) => println!("Result: {}", outcome),
        (Some(_), None) => println!("No trade is offered for this analysis."),
        (None, None) if offered => {
            println!("A trade is offered. Re-run with --decide yes|no to answer it.")
        }
        (None, None) => {}
    }

    Ok(())
}

fn print_summary(summary: &SummaryView, analyzed_at: chrono::DateTime<chrono::Utc>) {
    println!("Metrics:");
    for metric in &summary.metrics {
        print!(
            "  {:<20} {:>10}  [{}]",
            metric.label(),
            metric.score_text(),
            metric.severity
        );
        if let Some(comment) = &metric.comment {
            print!("  {}", comment);
        }
        println!();
    }

    let errors: Vec<_> = summary.errors().collect();
    if !errors.is_empty() {
        println!();
        println!("Partial data:");
        for metric in errors {
            println!(
                "  {}: {}",
                metric.label(),
                metric.error.as_deref().unwrap_or_default()
            );
        }
    }

    println!();
    println!("Recommendation: {}", summary.final_recommendation);
    println!(
        "Analyzed:       {} ({})",
        summary.analyzed_at,
        format_relative_time(analyzed_at)
    );
}

fn print_config(config: &Config) {
    println!("Config file:   {}", Config::config_path().display());
    println!("Service URL:   {}", config.service.normalized_base_url());
    match config.service.timeout_secs {
        Some(secs) => println!("Timeout:       {}s", secs),
        None => println!("Timeout:       none"),
    }
    println!("Log directory: {}", Config::state_dir().display());
    println!("Log level:     {}", config.logging.level);
}
