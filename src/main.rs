use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use lc_assist::config::{Settings, DEFAULT_CONFIG_FILE};
use lc_assist::extract;
use lc_assist::page::MemoryPage;
use lc_assist::pipeline;
use lc_assist::prompt::build_prompt;
use lc_assist::provider::{ProviderClient, ProviderKind};
use lc_assist::reconcile::reconcile;
use lc_assist::site::{self, PageKind};

#[derive(Parser)]
#[command(name = "lc_assist", about = "AI-assisted corrections for LangCorrect journal entries")]
struct Cli {
    /// Settings file (TOML); LC_* environment variables override it
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sentences found on a saved correction page
    Extract {
        /// Saved make_corrections HTML page
        page: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the native-language text of a saved journal page
    Native {
        /// Saved journal entry HTML page
        page: PathBuf,
    },
    /// Print the prompt that would be sent for a correction page
    Prompt {
        page: PathBuf,
        #[command(flatten)]
        context: NativeContext,
    },
    /// Reconcile a saved provider answer against a correction page
    Reconcile {
        page: PathBuf,
        /// File holding the raw provider answer
        response: PathBuf,
    },
    /// Run a full correction cycle and write the fill plan
    Correct {
        page: PathBuf,
        #[command(flatten)]
        context: NativeContext,
        /// Provider to use instead of the configured one
        #[arg(short, long, value_enum)]
        provider: Option<ProviderKind>,
        /// Write the fill plan (JSON edits) here instead of stdout
        #[arg(long)]
        plan_out: Option<PathBuf>,
        /// Also write the filled-in page as HTML
        #[arg(long)]
        html_out: Option<PathBuf>,
    },
    /// Tell which LangCorrect page a URL is and where to go next
    Route { url: String },
}

#[derive(clap::Args)]
struct NativeContext {
    /// Saved journal page to take native-language text from
    #[arg(long, conflicts_with = "native")]
    journal: Option<PathBuf>,
    /// Plain-text file with the native-language text
    #[arg(long)]
    native: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { page, json } => {
            let page = load_page(&page)?;
            let extracted = extract::extract_all(&page);
            if json {
                println!("{}", serde_json::to_string_pretty(&extracted)?);
                return Ok(());
            }
            if extracted.sentences.is_empty() {
                println!("No sentences found on this page.");
                return Ok(());
            }

            println!("{:>3} | {:<10} | {:<5} | {}", "#", "ID", "Title", "Sentence");
            println!("{}", "-".repeat(90));
            for (i, s) in extracted.sentences.iter().enumerate() {
                let title = if s.is_title { "yes" } else { "" };
                println!(
                    "{:>3} | {:<10} | {:<5} | {}",
                    i + 1,
                    s.id,
                    title,
                    truncate(&s.original, 64)
                );
            }
            println!(
                "\n{} sentences | level: {}",
                extracted.sentences.len(),
                extracted.level.as_deref().unwrap_or("unknown")
            );
            Ok(())
        }
        Commands::Native { page } => {
            let page = load_page(&page)?;
            match extract::native::extract(&page) {
                Some(text) => println!("{}", text),
                None => println!("No native-language text found."),
            }
            Ok(())
        }
        Commands::Prompt { page, context } => {
            let page = load_page(&page)?;
            let extracted = extract::extract_all(&page);
            let native = context.resolve()?;
            print!(
                "{}",
                build_prompt(&extracted.sentences, extracted.level.as_deref(), native.as_deref())
            );
            Ok(())
        }
        Commands::Reconcile { page, response } => {
            let page = load_page(&page)?;
            let sentences = extract::sentences::extract(&page);
            let raw = std::fs::read_to_string(&response)
                .with_context(|| format!("Failed to read {}", response.display()))?;
            let batch = reconcile(&raw, &sentences)?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
            Ok(())
        }
        Commands::Correct {
            page,
            context,
            provider,
            plan_out,
            html_out,
        } => {
            let settings = Settings::load(&cli.config)?;
            let credential = settings.credential(provider)?;
            let native = context.resolve()?;
            let mut page = load_page(&page)?;

            let client = ProviderClient::new(
                credential.provider,
                credential.api_key,
                credential.model,
                settings.request_timeout(),
            )?;
            info!("Using: {}", client.kind().label());

            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
            pb.set_message(format!("Correcting with {}...", client.kind().label()));
            pb.enable_steady_tick(Duration::from_millis(120));
            let outcome =
                pipeline::run_cycle(&mut page, &client, native.as_deref(), settings.fill_delay()).await;
            pb.finish_and_clear();
            let report = outcome?;

            let plan = serde_json::to_string_pretty(page.edits())?;
            match plan_out {
                Some(path) => std::fs::write(&path, plan)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", plan),
            }
            if let Some(path) = html_out {
                std::fs::write(&path, page.to_html())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            eprintln!(
                "Applied {} corrections ({} perfect, {} corrected, {} missing). Review and submit.",
                report.batch.corrections.len(),
                report.applied.perfect,
                report.applied.corrected,
                report.applied.missing,
            );
            if !report.batch.feedback.is_empty() {
                eprintln!("\nFeedback: {}", report.batch.feedback);
            }
            Ok(())
        }
        Commands::Route { url } => {
            match PageKind::classify(&url) {
                PageKind::Journal { slug } => {
                    println!("Journal entry: {}", slug);
                    println!("Save its HTML for --journal, then open {}", site::correction_url(&slug));
                }
                PageKind::CorrectionPage { slug } => {
                    println!("Correction page: {}", slug);
                    println!("Save its HTML and run `lc_assist correct <page>`");
                }
                PageKind::Other => {
                    println!("Open a LangCorrect journal page to use this tool.");
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

impl NativeContext {
    /// Native text from `--native` as-is, or scraped from `--journal`.
    fn resolve(&self) -> Result<Option<String>> {
        if let Some(path) = &self.native {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return Ok(Some(text));
        }
        match &self.journal {
            Some(path) => {
                let journal = load_page(path)?;
                let text = extract::native::extract(&journal);
                if text.is_none() {
                    info!("No native-language text on {}", path.display());
                }
                Ok(text)
            }
            None => Ok(None),
        }
    }
}

fn load_page(path: &Path) -> Result<MemoryPage> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(MemoryPage::parse(&html))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
