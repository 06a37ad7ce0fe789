//! Control loop, safety overrides, and cross-cycle state

mod controller;
mod safety;
mod state;

pub use controller::{Controller, ControllerConfig};
pub use safety::{EmergencyReason, SafetyDecision, SafetyOverride};
pub use state::{CancelToken, LoopState, ZoneState};
