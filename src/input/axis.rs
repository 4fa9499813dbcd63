//! Virtual axes and their aggregation over the handler stack

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::handler::Handler;
use super::registry::HandlerId;
use super::source::InputSource;

/// Physical source name of horizontal mouse motion
pub const MOUSE_X: &str = "Mouse X";
/// Physical source name of vertical mouse motion
pub const MOUSE_Y: &str = "Mouse Y";
/// Physical source name of the scroll wheel
pub const MOUSE_SCROLL_WHEEL: &str = "Mouse ScrollWheel";

/// What a virtual axis reads from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    MouseHorizontal,
    MouseVertical,
    ScrollWheel,
}

impl AxisKind {
    /// Name of the physical axis this kind resolves to
    pub const fn physical_name(self) -> &'static str {
        match self {
            AxisKind::MouseHorizontal => MOUSE_X,
            AxisKind::MouseVertical => MOUSE_Y,
            AxisKind::ScrollWheel => MOUSE_SCROLL_WHEEL,
        }
    }
}

/// A named virtual axis declared by a handler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub kind: AxisKind,
}

impl Axis {
    pub fn new(name: impl Into<String>, kind: AxisKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// An axis that currently reaches callers, and who declared it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveAxis {
    pub kind: AxisKind,
    pub owner: HandlerId,
}

/// Two handlers declared the same axis name; the upper one won
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisConflict {
    pub axis: String,
    pub kept: HandlerId,
    pub shadowed: HandlerId,
}

/// Axes visible through the current stack
#[derive(Debug, Clone, Default)]
pub struct LiveAxes {
    axes: HashMap<String, LiveAxis>,
    conflicts: Vec<AxisConflict>,
}

impl LiveAxes {
    /// Collect axes from handlers ordered top to base
    ///
    /// Stops after merging the first handler with `hard_block_axes`. On a
    /// name collision the topmost declaration is kept.
    pub fn aggregate<'a>(layers: impl IntoIterator<Item = (HandlerId, &'a Handler)>) -> Self {
        let mut live = LiveAxes::default();

        for (id, handler) in layers {
            for axis in handler.axes() {
                match live.axes.get(&axis.name) {
                    None => {
                        live.axes.insert(
                            axis.name.clone(),
                            LiveAxis {
                                kind: axis.kind,
                                owner: id,
                            },
                        );
                    }
                    // Same handler pushed twice
                    Some(existing) if existing.owner == id => {}
                    Some(existing) => {
                        tracing::warn!(
                            axis = %axis.name,
                            kept = %existing.owner,
                            shadowed = %id,
                            "axis declared by more than one active handler; keeping the topmost"
                        );
                        live.conflicts.push(AxisConflict {
                            axis: axis.name.clone(),
                            kept: existing.owner,
                            shadowed: id,
                        });
                    }
                }
            }

            if handler.policy().hard_block_axes {
                break;
            }
        }

        live
    }

    pub fn get(&self, name: &str) -> Option<&LiveAxis> {
        self.axes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.axes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LiveAxis)> {
        self.axes.iter().map(|(name, axis)| (name.as_str(), axis))
    }

    /// Name collisions found during the last aggregation
    pub fn conflicts(&self) -> &[AxisConflict] {
        &self.conflicts
    }

    /// Current value of a live axis; 0.0 when the axis is not live
    pub fn value(&self, name: &str, source: &dyn InputSource) -> f32 {
        self.axes
            .get(name)
            .map(|axis| source.axis_value(axis.kind.physical_name()))
            .unwrap_or(0.0)
    }
}
