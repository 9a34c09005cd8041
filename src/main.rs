use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wine_label_analyzer::app::App;
use wine_label_analyzer::models::Config;
use wine_label_analyzer::render::render_text;
use wine_label_analyzer::resolver::DEFAULT_MODEL;
use wine_label_analyzer::Error;

const NEW_KEY_HINT: &str = "Create a new key in a new project at \
     https://aistudio.google.com/app/apikey and set GOOGLE_API_KEY \
     (in the environment or a .env file).";

#[derive(Debug, Parser)]
#[command(name = "wine-label-analyzer")]
#[command(about = "Photograph a wine label, get a sommelier's summary")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a label photo.
    Analyze {
        /// Path to the label image (JPEG, PNG, WebP, HEIC).
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Model ID to use instead of the resolved default.
        #[arg(long, value_parser = parse_model_arg)]
        model: Option<String>,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List models available to the configured API key.
    Models {
        /// Include models that cannot read images.
        #[arg(long)]
        all: bool,
    },
}

fn parse_model_arg(input: &str) -> std::result::Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(format!("Invalid model ID '{}'", input));
    }
    Ok(trimmed.to_string())
}

/// What the user can do about a failed run.
fn remedy(error: &Error) -> String {
    if error.is_configuration() {
        format!("Check the model name and the API key. {}", NEW_KEY_HINT)
    } else {
        "Try again, or pick a different model with --model.".to_string()
    }
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

async fn run(args: CliArgs, config: &Config) -> wine_label_analyzer::Result<()> {
    let app = App::new(config);

    match args.command {
        Command::Analyze { image, model, json } => {
            let busy = spinner("소믈리에가 라벨을 분석 중입니다...");
            let outcome = app.analyze_file(&image, model.as_deref()).await;
            busy.finish_and_clear();

            let report = outcome?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
        }
        Command::Models { all } => {
            let overview = app.list_models(false).await?;
            for model in overview
                .models
                .iter()
                .filter(|m| all || m.accepts_image_and_text())
            {
                match &model.display_name {
                    Some(name) => println!("- {} ({})", model.id, name),
                    None => println!("- {}", model.id),
                }
            }
            if overview.default_available {
                println!("\n{} is available.", DEFAULT_MODEL);
            } else {
                println!(
                    "\n{} is not in the list. Keys from older or restricted projects often \
                     lack it. {}",
                    DEFAULT_MODEL, NEW_KEY_HINT
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wine_label_analyzer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", remedy(&e));
            std::process::exit(1);
        }
    };

    info!("Starting wine-label-analyzer");

    if let Err(e) = run(args, &config).await {
        error!("{}", e);
        eprintln!("{}", remedy(&e));
        std::process::exit(1);
    }

    Ok(())
}
