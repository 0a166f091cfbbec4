use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rift_columns::common::config::{Config, config_file, default_config_text};
use rift_columns::common::log;
use rift_columns::sys::script::{self, Scenario};
use tracing::warn;

#[derive(Parser)]
#[command(name = "rift-columns")]
#[command(about = "Column tiling engine, driven by scenario scripts")]
struct Cli {
    /// Configuration file to use instead of ~/.rift-columns.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario script and print the resulting layout
    Run {
        script: PathBuf,
        /// Print the layout as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
    /// Check the configuration file for problems
    CheckConfig {
        /// Fix what can be fixed and write the file back
        #[arg(long)]
        fix: bool,
    },
    /// Print the built-in default configuration
    PrintDefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = Parser::parse();
    log::init_logging();

    let path = cli.config.unwrap_or_else(config_file);
    match cli.command {
        Commands::Run { script, json } => run(&path, script, json),
        Commands::CheckConfig { fix } => check_config(&path, fix),
        Commands::PrintDefaultConfig => {
            print!("{}", default_config_text());
            Ok(())
        }
    }
}

fn run(config_path: &Path, script: PathBuf, json: bool) -> anyhow::Result<()> {
    let mut config = Config::read_or_default(config_path)?;
    for issue in config.validate() {
        warn!("{issue}");
    }
    config.auto_fix_values();

    let scenario = Scenario::load(&script)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("starting runtime")?;
    let reactor = runtime.block_on(scenario.run(config));

    if json {
        println!("{}", serde_json::to_string_pretty(&script::snapshot(&reactor))?);
    } else {
        print!("{}", script::draw(&reactor));
    }
    Ok(())
}

fn check_config(path: &Path, fix: bool) -> anyhow::Result<()> {
    if !path.exists() {
        println!("{} does not exist, the defaults are used", path.display());
        return Ok(());
    }
    let mut config = Config::read(path)?;
    let issues = config.validate();
    for issue in &issues {
        println!("{issue}");
    }
    if issues.is_empty() {
        println!("{} is valid", path.display());
    } else if fix {
        let fixes = config.auto_fix_values();
        config.save(path)?;
        println!("applied {fixes} fixes to {}", path.display());
    } else {
        process::exit(1);
    }
    Ok(())
}
