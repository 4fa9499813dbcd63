use anyhow::{Context, Result};
use clap::Parser;

use keystack::cli::CliArgs;
use keystack::commands;
use keystack::config::EngineConfig;
use keystack::input::{default_handler_defs, load_handler_defs, YamlBindingStore};

fn main() -> Result<()> {
    keystack::tracing::init();

    let args = CliArgs::parse();
    let config = EngineConfig::load();

    let bindings_dir = args
        .bindings_dir
        .clone()
        .or_else(|| config.resolved_bindings_dir())
        .context("No bindings directory available; pass --bindings-dir")?;
    tracing::debug!("Using bindings directory {}", bindings_dir.display());
    let store = YamlBindingStore::new(bindings_dir);

    let mut defs = default_handler_defs();
    if let Some(path) = &args.handlers {
        let extra = load_handler_defs(path)
            .with_context(|| format!("Failed to load handler definitions from {}", path.display()))?;
        defs.extend(extra);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&args.command, &store, &defs, &mut out)
}
