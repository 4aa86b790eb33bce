// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! `evalscript-gen`: render VERSION=3 evalscripts from configuration documents.
//!
//! Invariants:
//! - stdout carries only script or document text; logs and errors go to stderr.
//! - Nothing is written unless the whole document validated.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use evalscript_config::ConfigService;
use evalscript_config_fs::FsConfigStore;
use evalscript_core::{
    extract_fenced_script, has_version_header, DocumentFormat, EvalScript, EvalScriptDoc,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "evalscript-gen",
    version,
    about = "Render, extract and manage VERSION=3 evalscripts",
    disable_help_subcommand = true
)]
struct Cli {
    /// Log more (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Preset directory (defaults to the platform config directory).
    #[arg(long, value_name = "DIR", global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration document and render it as an evalscript.
    Render(RenderArgs),
    /// Pull a ```javascript block out of a text reply.
    Extract(ExtractArgs),
    /// Manage stored presets.
    #[command(subcommand)]
    Presets(PresetCommands),
}

#[derive(Args)]
struct RenderArgs {
    /// Configuration document (`-` or omitted: stdin).
    #[arg(short, long, value_name = "PATH", conflicts_with = "preset")]
    input: Option<PathBuf>,

    /// Document format; guessed from the file extension, JSON otherwise.
    #[arg(long, value_name = "json|yaml")]
    format: Option<DocumentFormat>,

    /// Write the script here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Render a stored preset instead of reading a document.
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Store the validated document as a preset.
    #[arg(long, value_name = "NAME")]
    save_preset: Option<String>,
}

#[derive(Args)]
struct ExtractArgs {
    /// Reply text (`-` or omitted: stdin).
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Write the script here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Fail when the script does not start with `//VERSION=3`.
    #[arg(long)]
    require_header: bool,
}

#[derive(Subcommand)]
enum PresetCommands {
    /// List stored presets.
    List,
    /// Print a stored preset document.
    Show {
        /// Preset name.
        name: String,
        /// Output format.
        #[arg(long, value_name = "json|yaml", default_value = "json")]
        format: DocumentFormat,
    },
    /// Delete a stored preset.
    Delete {
        /// Preset name.
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Render(args) => run_render(args, cli.store_dir.as_deref()),
        Commands::Extract(args) => run_extract(&args),
        Commands::Presets(cmd) => run_presets(cmd, cli.store_dir.as_deref()),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_render(args: RenderArgs, store_dir: Option<&Path>) -> Result<()> {
    let doc = match &args.preset {
        Some(name) => open_presets(store_dir)?
            .load::<EvalScriptDoc>(name)
            .with_context(|| format!("failed to load preset `{name}`"))?
            .with_context(|| format!("no preset named `{name}`"))?,
        None => {
            let text = read_input(args.input.as_deref())?;
            let format = args
                .format
                .or_else(|| args.input.as_deref().and_then(DocumentFormat::from_path))
                .unwrap_or_default();
            EvalScriptDoc::parse(&text, format).context("failed to parse configuration document")?
        }
    };

    let script = EvalScript::try_from(&doc).context("invalid configuration")?;

    if let Some(name) = &args.save_preset {
        open_presets(store_dir)?
            .save(name, &EvalScriptDoc::from(&script))
            .with_context(|| format!("failed to save preset `{name}`"))?;
        info!(preset = %name, "saved preset");
    }

    write_output(args.output.as_deref(), &script.render())
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let reply = read_input(args.input.as_deref())?;
    let Some(script) = extract_fenced_script(&reply) else {
        bail!("no ```javascript block found in input");
    };
    if !has_version_header(script) {
        if args.require_header {
            bail!("extracted script does not start with //VERSION=3");
        }
        warn!("extracted script does not start with //VERSION=3");
    }
    write_output(args.output.as_deref(), &format!("{script}\n"))
}

fn run_presets(cmd: PresetCommands, store_dir: Option<&Path>) -> Result<()> {
    let presets = open_presets(store_dir)?;
    match cmd {
        PresetCommands::List => {
            let keys = presets.keys().context("failed to list presets")?;
            let listing: String = keys.iter().map(|k| format!("{k}\n")).collect();
            write_output(None, &listing)
        }
        PresetCommands::Show { name, format } => {
            let doc = presets
                .load::<EvalScriptDoc>(&name)
                .with_context(|| format!("failed to load preset `{name}`"))?
                .with_context(|| format!("no preset named `{name}`"))?;
            let mut text = doc.to_text(format)?;
            if !text.ends_with('\n') {
                text.push('\n');
            }
            write_output(None, &text)
        }
        PresetCommands::Delete { name } => presets
            .delete(&name)
            .with_context(|| format!("failed to delete preset `{name}`")),
    }
}

fn open_presets(store_dir: Option<&Path>) -> Result<ConfigService<FsConfigStore>> {
    let store = match store_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("failed to open preset store")?;
    Ok(ConfigService::new(store))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = text.len(), "wrote output");
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(text.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(())
}
