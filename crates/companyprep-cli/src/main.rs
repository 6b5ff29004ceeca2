use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use companyprep_core::{
    Config, ConfigLoader, EventCollector, ProgressEvent, ResearchMode, ResearchRuntime,
    SessionOptions, run_research_session_with_options, run_stock_lookup,
};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "companyprep",
    version,
    about = "AI-powered company research assistant"
)]
struct Cli {
    /// Path to a companyprep.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full research session for a company.
    Research(ResearchArgs),
    /// Fetch just the live stock price for a company.
    Stock(StockArgs),
}

#[derive(Args, Debug)]
struct ResearchArgs {
    /// Company to research.
    #[arg(long)]
    company: String,

    /// Research depth: basic (web, finance, news) or pro (adds video).
    #[arg(long, default_value = "basic")]
    mode: String,

    /// Optional session ID (UUID generated when omitted).
    #[arg(long)]
    session: Option<String>,
}

#[derive(Args, Debug)]
struct StockArgs {
    /// Company to look up.
    #[arg(long)]
    company: String,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,companyprep_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let config = ConfigLoader::load(cli.config.clone())?;
        let result = match cli.command {
            Command::Research(args) => research_command(&config, args).await,
            Command::Stock(args) => stock_command(&config, args).await,
        };
        if let Err(err) = result {
            // One catch-all failure banner, whatever went wrong downstream.
            eprintln!("An error occurred: {err}");
            std::process::exit(1);
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

/// Print stage labels as the workflow reports real progress.
fn spawn_progress_printer(mut receiver: UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match event {
                ProgressEvent::StageStarted { stage, .. } => {
                    println!("{}", stage.label());
                }
                ProgressEvent::StageFinished {
                    stage,
                    duration_ms,
                    ok,
                    ..
                } => {
                    if !ok {
                        eprintln!("Stage failed: {}", stage.label());
                    } else {
                        info!(stage = ?stage, duration_ms, "stage finished");
                    }
                }
                ProgressEvent::SessionCompleted { .. } => break,
            }
        }
    })
}

async fn research_command(config: &Config, args: ResearchArgs) -> Result<()> {
    let mode: ResearchMode = args.mode.parse()?;
    let runtime = ResearchRuntime::from_config(config)?;

    info!(company = %args.company, mode = %mode, "starting research session");

    let (collector, receiver) = EventCollector::new();
    let printer = spawn_progress_printer(receiver);

    let mut options = SessionOptions::new(&args.company, mode).with_progress(collector);
    if let Some(session_id) = args.session {
        options = options.with_session_id(session_id);
    }

    let artifact = run_research_session_with_options(&runtime, options).await?;
    printer.await.ok();

    println!("\nResearch complete for {}!\n", artifact.company);
    println!("{}", artifact.markdown);
    Ok(())
}

async fn stock_command(config: &Config, args: StockArgs) -> Result<()> {
    let runtime = ResearchRuntime::from_config(config)?;

    let (collector, mut receiver) = EventCollector::new();
    let printer = tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            if let ProgressEvent::StageStarted { stage, .. } = event {
                println!("{}", stage.label());
            }
        }
    });

    let output = run_stock_lookup(&runtime, &args.company, Some(collector)).await?;
    printer.await.ok();

    println!("\nLive stock price fetched for {}!\n", args.company);
    println!("{}", output.body);
    Ok(())
}
