mod config;
mod export_cmd;
mod generate_cmd;
mod history_cmds;
mod plan_file;
mod serve_cmd;
mod slides_cmd;

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use classbuddy_core::lesson::LessonRequest;
use classbuddy_store::{FileStore, HistoryLedger};

use config::{ClassBuddyConfig, Overrides};

#[derive(Parser)]
#[command(name = "classbuddy", about = "Lesson plan generator with PDF, slide deck and Gamma exports")]
struct Cli {
    /// Chat gateway base URL (overrides CLASSBUDDY_LLM_URL env var)
    #[arg(long, global = true)]
    llm_url: Option<String>,

    /// Model name (overrides CLASSBUDDY_LLM_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Gamma API base URL (overrides CLASSBUDDY_GAMMA_URL env var)
    #[arg(long, global = true)]
    gamma_url: Option<String>,

    /// Directory holding the lesson history (overrides CLASSBUDDY_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            llm_url: self.llm_url.clone(),
            llm_model: self.model.clone(),
            gamma_url: self.gamma_url.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a classbuddy config file
    Init {
        /// API key for the chat gateway
        #[arg(long)]
        llm_api_key: Option<String>,
        /// API key for Gamma slide generation
        #[arg(long)]
        gamma_api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a lesson plan and print it as JSON
    Generate {
        /// Topic or content to teach (may be omitted with --source)
        content: Option<String>,
        /// Lesson length in minutes (10-480)
        #[arg(long, short = 't', default_value_t = 50)]
        time: u32,
        /// Subject, e.g. "Matemática"
        #[arg(long, short = 's', default_value = "")]
        subject: String,
        /// Text file with research material to base the lesson on
        #[arg(long)]
        source: Option<PathBuf>,
        /// Write the plan JSON here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<String>,
        /// Also save the plan to the history
        #[arg(long)]
        save: bool,
    },
    /// Create a Gamma presentation from a plan
    Slides {
        /// Plan JSON file (`-` for stdin)
        file: Option<String>,
        /// Use a saved plan from the history instead of a file
        #[arg(long)]
        from_history: Option<String>,
        /// Print the links as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a plan as PDF, PPTX or plain text
    Export {
        /// Plan JSON file (`-` for stdin)
        file: Option<String>,
        /// Use a saved plan from the history instead of a file
        #[arg(long)]
        from_history: Option<String>,
        /// pdf, pptx, txt, a comma-separated list, or all
        #[arg(long, short = 'f', default_value = "pdf")]
        format: String,
        /// Output file, or directory for several formats (defaults to the working directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Saved lesson history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Keep history in memory only
        #[arg(long)]
        ephemeral: bool,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List saved lessons, most recent first
    List {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one saved lesson as JSON
    Show {
        /// History entry ID
        id: String,
    },
    /// Delete one saved lesson
    Delete {
        /// History entry ID
        id: String,
    },
    /// Delete every saved lesson
    Clear,
    /// Save a plan file to the history
    Save {
        /// Plan JSON file (`-` for stdin)
        file: String,
    },
}

/// Open the history ledger under the configured data directory.
fn open_history(config: &ClassBuddyConfig) -> anyhow::Result<HistoryLedger> {
    let data_dir = &config.store.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    Ok(HistoryLedger::open(Box::new(FileStore::new(data_dir.clone()))))
}

/// Execute the `classbuddy init` command: write config file.
fn cmd_init(
    overrides: &Overrides,
    llm_api_key: Option<String>,
    gamma_api_key: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        llm: config::LlmSection {
            api_key: llm_api_key,
            base_url: overrides.llm_url.clone(),
            model: overrides.llm_model.clone(),
            max_tokens: None,
        },
        gamma: config::GammaSection {
            api_key: gamma_api_key,
            base_url: overrides.gamma_url.clone(),
        },
        storage: config::StorageSection {
            data_dir: overrides.data_dir.clone(),
        },
    };

    let path = config::save_config(&cfg)?;

    let show_key = |key: &Option<String>| match key {
        Some(k) => config::mask_secret(k),
        None => "(not set)".to_string(),
    };
    println!("Config written to {}", path.display());
    println!("  llm.api_key   = {}", show_key(&cfg.llm.api_key));
    println!("  gamma.api_key = {}", show_key(&cfg.gamma.api_key));
    if let Some(dir) = &cfg.storage.data_dir {
        println!("  storage.data_dir = {}", dir.display());
    }
    println!();
    println!("Next: run `classbuddy generate \"<topic>\" --subject <subject>`.");

    Ok(())
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = cli.overrides();

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    match cli.command {
        Commands::Init {
            llm_api_key,
            gamma_api_key,
            force,
        } => {
            cmd_init(&overrides, llm_api_key, gamma_api_key, force)?;
        }
        Commands::Generate {
            content,
            time,
            subject,
            source,
            output,
            save,
        } => {
            let resolved = ClassBuddyConfig::resolve(&overrides)?;
            let mut request = LessonRequest::new(content.unwrap_or_default(), time, subject);
            if let Some(path) = source {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read source file {}", path.display()))?;
                request = request.with_source_text(text);
            }
            let options = generate_cmd::GenerateOptions {
                output: output.as_deref(),
                save,
            };
            generate_cmd::run_generate(&resolved, &request, &options, &cancel, || {
                open_history(&resolved)
            })
            .await?;
        }
        Commands::Slides {
            file,
            from_history,
            json,
        } => {
            let resolved = ClassBuddyConfig::resolve(&overrides)?;
            let plan = plan_file::load_plan(file.as_deref(), from_history.as_deref(), || {
                open_history(&resolved)
            })?;
            slides_cmd::run_slides(&resolved, &plan, json, &cancel).await?;
        }
        Commands::Export {
            file,
            from_history,
            format,
            output,
        } => {
            let resolved = ClassBuddyConfig::resolve(&overrides)?;
            let plan = plan_file::load_plan(file.as_deref(), from_history.as_deref(), || {
                open_history(&resolved)
            })?;
            export_cmd::run_export(&plan, &format, output.as_deref())?;
        }
        Commands::History { command } => {
            let resolved = ClassBuddyConfig::resolve(&overrides)?;
            let mut ledger = open_history(&resolved)?;
            let mut stdout = std::io::stdout().lock();
            history_cmds::run_history_command(command, &mut ledger, &mut stdout)?;
        }
        Commands::Serve {
            bind,
            port,
            ephemeral,
        } => {
            let resolved = ClassBuddyConfig::resolve(&overrides)?;
            let history = if ephemeral {
                serve_cmd::memory_history()
            } else {
                open_history(&resolved)?
            };
            let state = serve_cmd::AppState::from_config(&resolved, history, cancel.clone())?;
            serve_cmd::run_serve(state, &bind, port).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "classbuddy", &mut std::io::stdout());
        }
    }

    Ok(())
}
