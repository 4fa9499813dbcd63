//! Handler definitions shipped with the crate
//!
//! `defaults.yaml` at the project root is embedded at compile time. If it
//! fails to parse, a hardcoded copy of the same handlers is used instead.

use std::path::Path;

use serde::Deserialize;

use super::axis::AxisKind;
use super::handler::{HandlerDef, HandlerPolicy};
use super::store::StoreError;
use super::types::{CursorLockMode, KeyCode, Phase};

/// Default handler definitions embedded at compile time
pub const DEFAULT_HANDLERS_YAML: &str = include_str!("../../defaults.yaml");

/// Root structure of a handler definition file
#[derive(Debug, Deserialize)]
struct HandlerDefsFile {
    handlers: Vec<HandlerDef>,
}

/// Parse handler definitions from a YAML string
pub fn parse_handler_defs(yaml: &str) -> Result<Vec<HandlerDef>, StoreError> {
    serde_yaml::from_str::<HandlerDefsFile>(yaml)
        .map(|file| file.handlers)
        .map_err(|e| StoreError::Parse {
            origin: "handler definitions".to_string(),
            message: e.to_string(),
        })
}

/// Load handler definitions from a YAML file
pub fn load_handler_defs(path: &Path) -> Result<Vec<HandlerDef>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let defs = parse_handler_defs(&content).map_err(|e| match e {
        StoreError::Parse { message, .. } => StoreError::Parse {
            origin: path.display().to_string(),
            message,
        },
        other => other,
    })?;
    tracing::info!("Loaded {} handler definitions from {}", defs.len(), path.display());
    Ok(defs)
}

/// The embedded handler definitions
pub fn default_handler_defs() -> Vec<HandlerDef> {
    match parse_handler_defs(DEFAULT_HANDLERS_YAML) {
        Ok(defs) => {
            tracing::debug!("Loaded embedded handler definitions ({} handlers)", defs.len());
            defs
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse embedded handler definitions: {}, using hardcoded defaults",
                e
            );
            builtin_handler_defs()
        }
    }
}

/// Hardcoded fallback matching `defaults.yaml`
pub fn builtin_handler_defs() -> Vec<HandlerDef> {
    let movement = HandlerDef::new("Player Movement")
        .policy(HandlerPolicy {
            cursor_lock_mode: CursorLockMode::Locked,
            ..HandlerPolicy::default()
        })
        .listener(Phase::Held, "Movement Left", Some(KeyCode::Char('a')), Some(KeyCode::Left))
        .listener(Phase::Held, "Movement Right", Some(KeyCode::Char('d')), Some(KeyCode::Right))
        .listener(Phase::Held, "Movement Forward", Some(KeyCode::Char('w')), Some(KeyCode::Up))
        .listener(Phase::Held, "Movement Back", Some(KeyCode::Char('s')), Some(KeyCode::Down))
        .held("Sprint", KeyCode::Shift)
        .just_pressed("Jump", KeyCode::Space)
        .listener(Phase::JustPressed, "Open Chat", Some(KeyCode::Char('t')), Some(KeyCode::Enter))
        .just_pressed("Use", KeyCode::Char('e'))
        .just_pressed("Slot 1", KeyCode::Char('1'))
        .just_pressed("Slot 2", KeyCode::Char('2'))
        .just_released("Stop Sprint", KeyCode::Shift)
        .axis("Look Horizontal", AxisKind::MouseHorizontal)
        .axis("Look Vertical", AxisKind::MouseVertical)
        .axis("Zoom", AxisKind::ScrollWheel);

    let chat = HandlerDef::new("Chat")
        .policy(HandlerPolicy {
            hard_block_keys: true,
            hard_block_axes: true,
            ..HandlerPolicy::default()
        })
        .listener(Phase::JustPressed, "Send", Some(KeyCode::Enter), Some(KeyCode::NumpadEnter))
        .just_pressed("Close", KeyCode::Escape)
        .just_pressed("History Up", KeyCode::Up)
        .just_pressed("History Down", KeyCode::Down)
        .axis("Scroll History", AxisKind::ScrollWheel);

    vec![movement, chat]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_definition() {
        let yaml = r#"
handlers:
  - name: Menu
    just_pressed:
      - name: Back
        positive: escape
"#;
        let defs = parse_handler_defs(yaml).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "Menu");
        assert_eq!(defs[0].policy, HandlerPolicy::default());
        assert_eq!(
            defs[0].defaults.find(Phase::JustPressed, "Back").and_then(|b| b.positive),
            Some(KeyCode::Escape)
        );
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        let yaml = "handlers:\n  - name: Bad\n    held:\n      - name: X\n        positive: warpdrive\n";
        assert!(matches!(parse_handler_defs(yaml), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_handler_defs(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
