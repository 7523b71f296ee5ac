//! Wordcard CLI - flashcard media builds from the command line
//!
//! A command-line interface for running the wordcard build pipeline.

#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use wordcard::config::{Config, StorageBackend};
use wordcard::error::{Error, Result};
use wordcard::prelude::*;

/// Default configuration file looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "wordcard.toml";

/// Wordcard - build illustrated, narrated flashcards for young learners
#[derive(Parser)]
#[command(name = "wordcard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "WORDCARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one flashcard: illustration, caption overlay and narration
    Build(BuildArgs),

    /// List recent sentences for a learner profile
    Recent(RecentArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Args)]
struct BuildArgs {
    /// Sentence printed on the card and narrated
    #[arg(short, long)]
    sentence: String,

    /// Prompt for the illustration model
    #[arg(short, long)]
    prompt: String,

    /// Narration language code (en, fr, es)
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Learner age in years
    #[arg(short, long)]
    age: Option<u8>,

    /// Content theme, e.g. "animals"
    #[arg(short, long)]
    theme: Option<String>,

    /// Target word the card teaches
    #[arg(short = 'w', long)]
    target_word: Option<String>,

    /// Learning goal recorded with the card
    #[arg(short = 'g', long)]
    learning_goal: Option<String>,

    /// Content tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Style notes for the illustration
    #[arg(long)]
    style: Option<String>,

    /// Generation id to assign instead of a random one
    #[arg(long)]
    id: Option<String>,

    /// Use mock providers and in-memory storage (no network, no files)
    #[arg(long)]
    mock: bool,
}

/// Arguments for the recent command
#[derive(Args)]
struct RecentArgs {
    /// Narration language code (en, fr, es)
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Learner age in years
    #[arg(short, long)]
    age: Option<u8>,

    /// Maximum number of sentences
    #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: usize,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show the configuration file path
    Path,
    /// Validate the configuration file
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "wordcard={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build(args) => cmd_build(args, cli.config).await,
        Commands::Recent(args) => cmd_recent(args, cli.config).await,
        Commands::Config(args) => cmd_config(&args, cli.config),
    }
}

/// Build one flashcard end to end.
async fn cmd_build(args: BuildArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let components = build_components(&config, args.mock)?;

    let input = UserInput {
        age: args.age,
        language: Language::from_code(&args.language),
        theme: args.theme.clone(),
        target_word: args.target_word.clone(),
    };
    let pedagogy = PedagogicalOutput {
        sentence: args.sentence.clone(),
        learning_goal: args.learning_goal.clone().unwrap_or_else(|| {
            match &args.target_word {
                Some(word) => format!("vocabulary: {word}"),
                None => "sentence comprehension".to_owned(),
            }
        }),
        tags: args.tags.clone(),
    };
    let creative = CreativeOutput {
        image_prompt: args.prompt.clone(),
        style_description: args.style.clone(),
    };

    let id = components
        .records
        .persist_initial(args.id.map(GenerationId::from), &input, &pedagogy)
        .await?;
    components.records.record_creative(&id, &creative).await?;
    println!("Generation {id}");

    let request = BuildRequest {
        id: id.clone(),
        image_prompt: creative.image_prompt,
        sentence: pedagogy.sentence,
        language: input.language,
    };

    match components.pipeline.build(&request).await {
        Ok(assets) => {
            println!("  image: {}", assets.final_image);
            println!("  audio: {}", assets.final_audio);
            Ok(())
        }
        Err(err) => {
            if let Err(mark_err) = components.records.mark_failed(&id, &err.to_string()).await {
                tracing::warn!(error = %mark_err, "could not mark generation failed");
            }
            Err(err)
        }
    }
}

/// List recent sentences for a learner profile.
async fn cmd_recent(args: RecentArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let records = GenerationStore::open(&config.database.path)?;

    let recent = records
        .fetch_recent(Language::from_code(&args.language), args.age, args.limit)
        .await?;

    if recent.is_empty() {
        println!("No generations for this profile.");
    } else {
        for sentence in recent {
            println!("{sentence}");
        }
    }
    Ok(())
}

/// Configuration management.
fn cmd_config(args: &ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            let config_file = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            let config = load_config(config_path.as_deref())?;
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| Error::config(format!("rendering config: {e}")))?;
            println!("{rendered}");
        }
        ConfigCommands::Validate => {
            let config_file = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
            if !config_file.exists() {
                println!("error: configuration file does not exist");
                return Ok(());
            }
            match Config::load(&config_file) {
                Ok(_) => println!("Configuration is valid"),
                Err(e) => println!("error: {e}"),
            }
        }
    }

    Ok(())
}

/// Load configuration, falling back to defaults when no file is present.
/// Environment variables fill any gaps the file leaves.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Config::load(default)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config.with_env())
}

/// Assembled pipeline plus the record store it persists into.
struct Components {
    pipeline: BuildPipeline,
    records: GenerationStore,
}

/// Wire providers, blob storage and the record store per configuration.
///
/// With `mock` set everything is in-process: mock media models, an
/// in-memory blob store and an in-memory record store.
fn build_components(config: &Config, mock: bool) -> Result<Components> {
    let records = if mock {
        GenerationStore::in_memory()?
    } else {
        GenerationStore::open(&config.database.path)?
    };

    let blobs: Arc<dyn BlobStore> = if mock {
        Arc::new(MemStore::new(config.storage.container.clone()))
    } else {
        match config.storage.backend {
            StorageBackend::Fs => Arc::new(FsStore::from_config(&config.storage)),
            StorageBackend::Memory => Arc::new(MemStore::new(config.storage.container.clone())),
        }
    };

    let image_model: Arc<dyn ImageModel> = if mock {
        Arc::new(MockImageModel::new())
    } else {
        Arc::new(GeminiImageModel::from_config(&config.gemini)?)
    };
    let speech_model: Arc<dyn SpeechModel> = if mock {
        Arc::new(MockSpeechModel::new())
    } else {
        Arc::new(CloudTtsModel::from_config(&config.tts)?)
    };

    let compositor = CardCompositor::new(Arc::clone(&blobs), &config.compose)?;
    let pipeline = BuildPipeline::new(
        ImageGenerator::new(image_model, Arc::clone(&blobs)),
        SpeechSynthesizer::new(speech_model, Arc::clone(&blobs)),
        compositor,
        records.clone(),
    );

    Ok(Components { pipeline, records })
}
