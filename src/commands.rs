//! Execution of CLI subcommands against a binding store

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::cli::Command;
use crate::config_paths;
use crate::input::{
    bindings_to_yaml, BindingStore, Bindings, Handler, HandlerDef, InitSource, KeyCode, Slot,
    DEFAULT_HANDLERS_YAML,
};

#[derive(Serialize)]
struct ShowOutput<'a> {
    handler: &'a str,
    source: &'a str,
    #[serde(flatten)]
    bindings: &'a Bindings,
}

/// Run one subcommand, writing human-readable output to `out`
pub fn run(
    command: &Command,
    store: &dyn BindingStore,
    defs: &[HandlerDef],
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::List => list(store, defs, out),
        Command::Show { handler, json } => show(store, defs, handler, *json, out),
        Command::Bind {
            handler,
            listener,
            key,
            alternative,
        } => {
            let slot = if *alternative {
                Slot::Alternative
            } else {
                Slot::Positive
            };
            bind(store, defs, handler, listener, key, slot, out)
        }
        Command::Reset { handler } => {
            if store.remove(handler)? {
                writeln!(out, "{handler}: saved bindings removed")?;
            } else {
                writeln!(out, "{handler}: nothing saved")?;
            }
            Ok(())
        }
        Command::Defaults => {
            out.write_all(DEFAULT_HANDLERS_YAML.as_bytes())?;
            Ok(())
        }
        Command::Paths => paths(out),
    }
}

fn list(store: &dyn BindingStore, defs: &[HandlerDef], out: &mut dyn Write) -> Result<()> {
    let saved: BTreeSet<String> = store.list()?.into_iter().collect();

    let mut names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
    names.extend(
        saved
            .iter()
            .map(String::as_str)
            .filter(|name| !defs.iter().any(|d| d.name == *name)),
    );

    for name in names {
        let source = if saved.contains(name) { "saved" } else { "defaults" };
        writeln!(out, "{name}\t{source}")?;
    }
    Ok(())
}

/// Definition for a handler name, or a bare one if only saved bindings exist
fn definition(store: &dyn BindingStore, defs: &[HandlerDef], name: &str) -> Result<HandlerDef> {
    if let Some(def) = defs.iter().find(|d| d.name == name) {
        return Ok(def.clone());
    }
    if store.read(name)?.is_some() {
        return Ok(HandlerDef::new(name));
    }
    bail!("unknown handler '{name}'")
}

fn show(
    store: &dyn BindingStore,
    defs: &[HandlerDef],
    name: &str,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let def = definition(store, defs, name)?;
    let (bindings, source) = match store.read(name)? {
        Some(saved) => (saved, "saved"),
        None => (def.defaults, "defaults"),
    };

    if json {
        let output = ShowOutput {
            handler: name,
            source,
            bindings: &bindings,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        writeln!(out, "# {source}")?;
        out.write_all(bindings_to_yaml(name, &bindings)?.as_bytes())?;
    }
    Ok(())
}

fn bind(
    store: &dyn BindingStore,
    defs: &[HandlerDef],
    name: &str,
    listener: &str,
    key: &str,
    slot: Slot,
    out: &mut dyn Write,
) -> Result<()> {
    let key: KeyCode = key.parse()?;
    let mut handler = Handler::new(definition(store, defs, name)?);
    if handler.init(store) == InitSource::Defaults {
        tracing::debug!(handler = name, "No saved bindings; starting from defaults");
    }

    let change = handler.rebind_key(listener, slot, key)?;
    store.write(name, &handler.bindings())?;

    let old = change
        .old
        .map(|k| k.to_string())
        .unwrap_or_else(|| "none".to_string());
    writeln!(out, "{name} / {listener} ({slot}): {old} -> {}", change.new)?;
    Ok(())
}

fn paths(out: &mut dyn Write) -> Result<()> {
    let display = |path: Option<std::path::PathBuf>| {
        path.map(|p| p.display().to_string())
            .unwrap_or_else(|| "(unavailable)".to_string())
    };
    writeln!(out, "config:   {}", display(config_paths::config_file()))?;
    writeln!(out, "bindings: {}", display(config_paths::bindings_dir()))?;
    writeln!(out, "log:      {}", display(config_paths::log_file()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{builtin_handler_defs, MemoryBindingStore, Phase};

    fn run_to_string(command: Command, store: &MemoryBindingStore) -> Result<String> {
        let mut out = Vec::new();
        run(&command, store, &builtin_handler_defs(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_list_marks_saved_handlers() {
        let store = MemoryBindingStore::new();
        store.write("Chat", &Bindings::new()).unwrap();
        store.write("Custom", &Bindings::new()).unwrap();

        let output = run_to_string(Command::List, &store).unwrap();
        assert_eq!(
            output,
            "Player Movement\tdefaults\nChat\tsaved\nCustom\tsaved\n"
        );
    }

    #[test]
    fn test_bind_saves_and_reports_change() {
        let store = MemoryBindingStore::new();
        let output = run_to_string(
            Command::Bind {
                handler: "Player Movement".to_string(),
                listener: "Jump".to_string(),
                key: "j".to_string(),
                alternative: false,
            },
            &store,
        )
        .unwrap();

        assert_eq!(output, "Player Movement / Jump (positive): space -> j\n");
        let saved = store.read("Player Movement").unwrap().unwrap();
        assert_eq!(
            saved.find(Phase::JustPressed, "Jump").and_then(|b| b.positive),
            Some(KeyCode::Char('j'))
        );
        // The rest of the defaults were saved alongside
        assert!(saved.find(Phase::Held, "Movement Left").is_some());
    }

    #[test]
    fn test_bind_rejects_unknown_names_and_keys() {
        let store = MemoryBindingStore::new();
        let bad_listener = Command::Bind {
            handler: "Chat".to_string(),
            listener: "Teleport".to_string(),
            key: "t".to_string(),
            alternative: false,
        };
        assert!(run_to_string(bad_listener, &store).is_err());

        let bad_key = Command::Bind {
            handler: "Chat".to_string(),
            listener: "Send".to_string(),
            key: "hyper".to_string(),
            alternative: true,
        };
        assert!(run_to_string(bad_key, &store).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_bind_refuses_key_of_another_listener() {
        let store = MemoryBindingStore::new();
        let taken = Command::Bind {
            handler: "Chat".to_string(),
            listener: "Send".to_string(),
            key: "escape".to_string(),
            alternative: false,
        };
        let err = run_to_string(taken, &store).unwrap_err();
        assert!(err.to_string().contains("Close"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_show_json() {
        let store = MemoryBindingStore::new();
        let output = run_to_string(
            Command::Show {
                handler: "Chat".to_string(),
                json: true,
            },
            &store,
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["handler"], "Chat");
        assert_eq!(value["source"], "defaults");
        assert_eq!(value["just_pressed"][0]["name"], "Send");
        assert_eq!(value["just_pressed"][0]["positive"], "enter");
    }

    #[test]
    fn test_show_unknown_handler() {
        let store = MemoryBindingStore::new();
        let err = run_to_string(
            Command::Show {
                handler: "Ghost".to_string(),
                json: false,
            },
            &store,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_reset() {
        let store = MemoryBindingStore::new();
        store.write("Chat", &Bindings::new()).unwrap();

        let reset = || Command::Reset {
            handler: "Chat".to_string(),
        };
        assert_eq!(run_to_string(reset(), &store).unwrap(), "Chat: saved bindings removed\n");
        assert_eq!(run_to_string(reset(), &store).unwrap(), "Chat: nothing saved\n");
    }

    #[test]
    fn test_defaults_prints_embedded_yaml() {
        let store = MemoryBindingStore::new();
        let output = run_to_string(Command::Defaults, &store).unwrap();
        assert_eq!(output, DEFAULT_HANDLERS_YAML);
    }
}
