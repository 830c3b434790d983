//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use notecard_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "notecard")]
#[command(version)]
#[command(about = "Renders social preview cards for notes and scorecards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the preview image HTTP server
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long, env = "NOTECARD_BIND", value_name = "ADDR")]
        bind: Option<String>,

        /// Directory of <reference>.json content documents (overrides content.dir)
        #[arg(long, value_name = "DIR")]
        content_dir: Option<PathBuf>,
    },

    /// Render one content document to a PNG file
    Render {
        /// Content document (JSON)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Where to write the PNG
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Preview style (default, telegram, twitter, facebook)
        #[arg(short, long)]
        style: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Write the commented default config (refuses to overwrite)
    Init,
    /// Print the effective config after defaults are applied
    Show,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn load_config() -> Result<config::Config> {
    config::Config::load().context("load config")
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { bind, content_dir } => {
            let mut config = load_config()?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(dir) = content_dir {
                config.content.dir = Some(dir);
            }
            commands::serve::run(&config).await
        }

        Commands::Render {
            input,
            output,
            style,
        } => commands::render::run(&load_config()?, &input, &output, style.as_deref()).await,

        Commands::Config { command } => {
            let path = config::paths::config_path();
            match command {
                ConfigCommands::Path => {
                    commands::config::path(&path);
                    Ok(())
                }
                ConfigCommands::Init => commands::config::init(&path),
                ConfigCommands::Show => commands::config::show(&path),
            }
        }
    }
}
