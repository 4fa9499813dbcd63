//! Persisted binding shape: listener key slots and axes for one handler

use serde::{Deserialize, Serialize};

use super::axis::{Axis, AxisKind};
use super::types::{KeyCode, Phase};

/// Key slots of one named listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive: Option<KeyCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<KeyCode>,
}

impl ListenerBinding {
    pub fn new(name: impl Into<String>, positive: Option<KeyCode>, alternative: Option<KeyCode>) -> Self {
        Self {
            name: name.into(),
            positive,
            alternative,
        }
    }
}

/// All listener bindings and axes of a handler, grouped by phase
///
/// This is what the persistence gateway reads and writes. Policy flags are
/// not part of it; they always come from the handler definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bindings {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub just_pressed: Vec<ListenerBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub held: Vec<ListenerBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub just_released: Vec<ListenerBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub axes: Vec<Axis>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener list for a phase
    pub fn phase(&self, phase: Phase) -> &[ListenerBinding] {
        match phase {
            Phase::JustPressed => &self.just_pressed,
            Phase::Held => &self.held,
            Phase::JustReleased => &self.just_released,
        }
    }

    pub fn phase_mut(&mut self, phase: Phase) -> &mut Vec<ListenerBinding> {
        match phase {
            Phase::JustPressed => &mut self.just_pressed,
            Phase::Held => &mut self.held,
            Phase::JustReleased => &mut self.just_released,
        }
    }

    /// Add a listener binding (builder pattern)
    pub fn listener(
        mut self,
        phase: Phase,
        name: impl Into<String>,
        positive: Option<KeyCode>,
        alternative: Option<KeyCode>,
    ) -> Self {
        self.phase_mut(phase)
            .push(ListenerBinding::new(name, positive, alternative));
        self
    }

    /// Add an axis (builder pattern)
    pub fn axis(mut self, name: impl Into<String>, kind: AxisKind) -> Self {
        self.axes.push(Axis::new(name, kind));
        self
    }

    /// Find a listener binding by phase and name
    pub fn find(&self, phase: Phase, name: &str) -> Option<&ListenerBinding> {
        self.phase(phase).iter().find(|b| b.name == name)
    }

    /// Total number of listener bindings across phases
    pub fn listener_count(&self) -> usize {
        self.just_pressed.len() + self.held.len() + self.just_released.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listener_count() == 0 && self.axes.is_empty()
    }
}
