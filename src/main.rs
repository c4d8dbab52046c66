use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod filter;
mod llm;
mod orchestrator;
mod plan;
mod render;
mod rules;
mod spec;

use config::Settings;
use error::PipelineError;
use llm::anthropic::AnthropicClient;
use orchestrator::Pipeline;
use rules::RulesCache;
use spec::PageSpec;

#[derive(Parser)]
#[command(name = "page-spec-bridge")]
#[command(about = "Turns a brief into a validated page spec via a copywriter and orchestrator model", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file; defaults to ./page-spec-bridge.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a page spec from a brief.
    Generate {
        brief: String,

        /// Tone or style hint passed to the copywriter.
        #[arg(long)]
        style: Option<String>,

        /// Write the page spec here instead of stdout.
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,

        /// Rasterize the page to a PNG file.
        #[arg(long)]
        png: Option<PathBuf>,

        /// Show the page in an X11 window.
        #[arg(long)]
        window: bool,
    },
    /// Answer a question about Charles Pfaff and his work.
    Ask { question: String },
    /// Validate saved orchestrator output offline.
    Validate {
        file: PathBuf,

        #[arg(long)]
        png: Option<PathBuf>,
    },
    /// Run the topic filter on a piece of text.
    Filter { text: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.cmd {
        Commands::Generate {
            brief,
            style,
            out,
            png,
            window,
        } => {
            let client = AnthropicClient::from_settings(&settings)?;
            let rules = RulesCache::new(&settings.rules_dir, settings.rules_poll_interval());
            let pipeline = Pipeline::new(&client, &rules, settings.max_input_chars);

            let page = match pipeline.generate(&brief, style.as_deref()) {
                Ok(page) => page,
                Err(err) => return Ok(fail(&err)),
            };
            emit_page(&page, out.as_deref())?;
            preview(&page, &settings, png.as_deref(), window)?;
        }
        Commands::Ask { question } => {
            let client = AnthropicClient::from_settings(&settings)?;
            let rules = RulesCache::new(&settings.rules_dir, settings.rules_poll_interval());
            let pipeline = Pipeline::new(&client, &rules, settings.max_input_chars);
            match pipeline.answer(&question) {
                Ok(answer) => println!("{}", answer.text),
                Err(err) => return Ok(fail(&err)),
            }
        }
        Commands::Validate { file, png } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            match orchestrator::page_from_model_output(&text) {
                Ok(page) => {
                    emit_page(&page, None)?;
                    preview(&page, &settings, png.as_deref(), false)?;
                }
                Err(PipelineError::Validation(invalid)) => {
                    for violation in &invalid.violations {
                        println!("{violation}");
                    }
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => {
                    eprintln!("{err}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Filter { text } => {
            let result = filter::filter_question(&text);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn fail(err: &PipelineError) -> ExitCode {
    tracing::debug!(error = %err, "pipeline failed");
    eprintln!("{}", err.user_message());
    ExitCode::FAILURE
}

fn emit_page(page: &PageSpec, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(page)?;
    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote page spec");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn preview(page: &PageSpec, settings: &Settings, png: Option<&Path>, window: bool) -> Result<()> {
    if png.is_none() && !window {
        return Ok(());
    }
    let font = render::load_font();
    let frame = render::render_page(page, font.as_ref(), settings.preview_width);

    if let Some(path) = png {
        frame
            .save_png(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), width = frame.width, height = frame.height, "wrote preview");
    }
    if window {
        render::window::show(&frame, &frame.links, "page-spec-bridge preview")
            .context("preview window failed")?;
    }
    Ok(())
}
