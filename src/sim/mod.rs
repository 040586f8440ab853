//! Deterministic repair simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Externally-driven ticks only (no internal timers, nothing to cancel)
//! - Seeded RNG only
//! - Progress is data (elapsed/duration, dirt/progress) recomputed each tick
//! - No rendering or platform dependencies

pub mod cleaning;
pub mod effects;
pub mod repair;
pub mod session;
pub mod state;
pub mod tools;

pub use effects::{EffectKind, EffectsEngine, Particle, VisualEffect};
pub use session::{
    InitError, ProgressReport, RenderSnapshot, RepairSession, TickInput,
};
pub use state::{
    AreaRegistry, Bounds, CleaningStage, CleaningTool, ComponentKind, Problem, ProblemKind,
    RepairArea, RepairState, ScrubTexture, SessionPhase, SessionState, SessionStats, SimEvent,
    Tool, ToolKind, ToolRack,
};
