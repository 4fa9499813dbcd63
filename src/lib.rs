//! keystack - layered input routing
//!
//! Handlers (named layers of key listeners and virtual axes) are pushed onto
//! a stack; each tick, key events flow from the top of the stack downwards
//! under per-handler blocking policy. Bindings persist per handler and can
//! be rebound at runtime.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod input;
pub mod tracing;

// Re-export commonly used types
pub use config::EngineConfig;
pub use input::{
    EngineError, HandlerDef, HandlerId, HandlerPolicy, InputEngine, InputSource, InputState,
    KeyCode, Phase,
};
