//! Layered input routing
//!
//! Handlers are named layers of key listeners and virtual axes. Active
//! handlers sit on a stack; each tick, key events travel from the top of the
//! stack downwards until a handler blocks them.
//!
//! # Architecture
//!
//! ```text
//! winit events → WinitInputCollector → InputState (InputSource)
//!                                           │
//!                    InputEngine::tick ◄────┘
//!                    ├─ poll rebind sessions
//!                    ├─ router::dispatch  (stack top → base, block / hard block)
//!                    └─ CursorSink::set_cursor_policy(top.cursor_lock_mode)
//! ```
//!
//! Bindings come from a [`BindingStore`] when saved, otherwise from the
//! handler's [`HandlerDef`] defaults.
//!
//! ```ignore
//! let mut engine = InputEngine::new(YamlBindingStore::new(bindings_dir));
//! let movement = engine.attach(HandlerDef::new("Player Movement").held("Forward", KeyCode::Char('w')))?;
//! engine.add_callback(movement, Phase::Held, "Forward", || println!("forward"));
//! engine.push(movement)?;
//!
//! // once per frame
//! engine.tick(collector.state(), &mut cursor);
//! collector.end_tick();
//! ```

mod axis;
mod binding;
mod defaults;
mod engine;
mod error;
mod handler;
mod listener;
mod rebind;
mod registry;
pub mod router;
mod source;
mod stack;
mod store;
mod types;
mod winit_adapter;

pub use axis::{Axis, AxisConflict, AxisKind, LiveAxes, LiveAxis, MOUSE_SCROLL_WHEEL, MOUSE_X, MOUSE_Y};
pub use binding::{Bindings, ListenerBinding};
pub use defaults::{
    builtin_handler_defs, default_handler_defs, load_handler_defs, parse_handler_defs,
    DEFAULT_HANDLERS_YAML,
};
pub use engine::{InputEngine, TickReport};
pub use error::EngineError;
pub use handler::{Handler, HandlerDef, HandlerPolicy, InitSource, KeyChange};
pub use listener::{Callback, CallbackId, Listener};
pub use rebind::{
    AbandonReason, Poll, RebindCallback, RebindId, RebindOutcome, RebindRequest, RebindSession,
    RebindState,
};
pub use registry::{HandlerId, Registry};
pub use source::{ButtonState, CursorSink, InputSource, InputState, RecordingCursorSink};
pub use stack::HandlerStack;
pub use store::{
    bindings_to_yaml, file_stem_for, parse_bindings_yaml, BindingStore, MemoryBindingStore,
    NullBindingStore, StoreError, YamlBindingStore,
};
pub use types::{CursorLockMode, KeyCode, KeyParseError, Phase, Slot};
pub use winit_adapter::{key_from_mouse_button, key_from_physical, WinitInputCollector};
