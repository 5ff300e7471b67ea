use std::path::PathBuf;
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use pulse_layout::common::config::{Config, RemoteSettings, config_file, snapshot_file};
use pulse_layout::common::log;
use pulse_layout::gateway::wire::LayoutRecord;
use pulse_layout::gateway::{HttpGateway, SerializedGateway};
use pulse_layout::layout_engine::{LayoutEngine, LayoutSource};
use pulse_layout::model::{Layout, SessionSnapshot, WidgetSize};

type Engine = LayoutEngine<SerializedGateway<HttpGateway>>;

#[derive(Parser)]
#[command(version, about = "Inspect and edit dashboard layouts")]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Session file holding the working copy between runs.
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Never contact the layout service; reads serve the built-in layout.
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a layout (default: "default") and print it
    Show { name: Option<String> },
    /// List every saved layout
    List,
    /// Place a new widget at the first free spot
    AddWidget {
        id: String,
        w: u32,
        h: u32,
        #[arg(long)]
        min_w: Option<u32>,
        #[arg(long)]
        max_w: Option<u32>,
        #[arg(long)]
        min_h: Option<u32>,
        #[arg(long)]
        max_h: Option<u32>,
    },
    RemoveWidget { id: String },
    MoveWidget { id: String, x: u32, y: u32 },
    ResizeWidget { id: String, w: u32, h: u32 },
    /// Save the working copy as a new layout
    Save,
    /// Overwrite the saved copy of the working layout
    Update,
    /// Delete a saved layout
    Delete { name: String },
    /// Go back to the default layout
    Reset,
    /// Report problems with the working copy
    Check,
    /// Forget the working copy
    Clear,
    /// Check the configuration file and exit
    ValidateConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    sigpipe::reset();
    let cli = Cli::parse();
    log::init_logging();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(config_file);
    let mut config = Config::read_or_default(&config_path)?;
    config.settings.use_remote_layouts &= !cli.offline;

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("{issue}");
        }
        bail!("{} problem(s) in {}", issues.len(), config_path.display());
    }
    if let Command::ValidateConfig = cli.command {
        println!("Config validation passed");
        return Ok(());
    }

    // The gateway is never called when remote layouts are off.
    let remote = if config.settings.use_remote_layouts {
        config.remote.clone()
    } else {
        RemoteSettings::default()
    };
    let gateway = SerializedGateway::new(HttpGateway::new(&remote)?);
    let mut engine = LayoutEngine::new(gateway, config.settings.clone());

    let state_path = cli.state.unwrap_or_else(snapshot_file);
    engine.restore(SessionSnapshot::load_or_default(&state_path)?);

    execute(&mut engine, cli.command).await?;

    engine.snapshot().save(&state_path)?;
    Ok(())
}

async fn execute(engine: &mut Engine, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Show { name } => {
            let source = match name {
                Some(name) => engine.fetch(&name).await,
                None => engine.fetch_default().await,
            };
            if let (LayoutSource::Fallback, Some(err)) = (source, engine.error()) {
                eprintln!("warning: {err}");
            }
            print_layout(engine.current_layout())?;
        }
        Command::List => {
            let records: Vec<LayoutRecord> =
                engine.fetch_all().await?.iter().map(LayoutRecord::from).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::AddWidget { id, w, h, min_w, max_w, min_h, max_h } => {
            ensure_layout(engine).await;
            let size = WidgetSize::new(w, h)
                .with_width_bounds(min_w, max_w)
                .with_height_bounds(min_h, max_h);
            engine.add_widget(&id, size)?;
            print_layout(engine.current_layout())?;
        }
        Command::RemoveWidget { id } => {
            ensure_layout(engine).await;
            if !engine.remove_widget(&id) {
                eprintln!("warning: no widget \"{id}\" in the layout");
            }
            print_layout(engine.current_layout())?;
        }
        Command::MoveWidget { id, x, y } => {
            ensure_layout(engine).await;
            engine.move_widget(&id, x, y)?;
            print_layout(engine.current_layout())?;
        }
        Command::ResizeWidget { id, w, h } => {
            ensure_layout(engine).await;
            engine.resize_widget(&id, w, h)?;
            print_layout(engine.current_layout())?;
        }
        Command::Save => {
            let saved = engine.save().await?;
            print_layout(Some(saved))?;
        }
        Command::Update => {
            let updated = engine.update().await?;
            print_layout(Some(updated))?;
        }
        Command::Delete { name } => {
            engine.delete_layout(&name).await?;
            print_layout(engine.current_layout())?;
        }
        Command::Reset => {
            if engine.reset().await == LayoutSource::Fallback {
                if let Some(err) = engine.error() {
                    eprintln!("warning: {err}");
                }
            }
            print_layout(engine.current_layout())?;
        }
        Command::Check => {
            let layout = engine.current_layout().context("no working layout, run `show` first")?;
            let issues = layout.validate();
            if !issues.is_empty() {
                for issue in &issues {
                    eprintln!("{issue}");
                }
                bail!("layout \"{}\" has {} problem(s)", layout.name, issues.len());
            }
            println!("Layout \"{}\" is valid", layout.name);
        }
        Command::Clear => {
            engine.clear();
            print_layout(None)?;
        }
        // Answered before the engine is built.
        Command::ValidateConfig => {}
    }
    Ok(())
}

/// Local edits start from the default layout when there is no working copy.
async fn ensure_layout(engine: &mut Engine) {
    if !engine.has_layout() {
        engine.fetch_default().await;
    }
}

fn print_layout(layout: Option<&Layout>) -> anyhow::Result<()> {
    let record = layout.map(LayoutRecord::from);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
