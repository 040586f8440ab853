//! Session state and core simulation types
//!
//! Everything the per-tick simulation reads or mutates lives here. The
//! authoritative fix count is always recomputed by scanning the registry,
//! never kept as a separately incremented counter.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::EffectsEngine;

/// Robot-pet component a problem is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    PowerCore,
    MotorSystem,
    SensorArray,
    ChassisPlating,
    ProcessingUnit,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::PowerCore => "power core",
            ComponentKind::MotorSystem => "motor system",
            ComponentKind::SensorArray => "sensor array",
            ComponentKind::ChassisPlating => "chassis plating",
            ComponentKind::ProcessingUnit => "processing unit",
        }
    }

    /// Scrub texture rendered under an active cleaning stage
    pub fn scrub_texture(&self) -> ScrubTexture {
        match self {
            ComponentKind::PowerCore => ScrubTexture::Casing,
            ComponentKind::MotorSystem => ScrubTexture::Gears,
            ComponentKind::SensorArray => ScrubTexture::Lens,
            ComponentKind::ChassisPlating => ScrubTexture::Plate,
            ComponentKind::ProcessingUnit => ScrubTexture::Circuit,
        }
    }
}

/// Malfunction category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    Broken,
    Dirty,
    Disconnected,
    LowPower,
}

/// Repair tools on the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolKind {
    Screwdriver,
    Wrench,
    OilCan,
    CircuitBoard,
    CleaningBrush,
}

impl ToolKind {
    /// All tools in palette order (keyboard shortcuts 1-5 map to this order)
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Screwdriver,
        ToolKind::Wrench,
        ToolKind::OilCan,
        ToolKind::CircuitBoard,
        ToolKind::CleaningBrush,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::Screwdriver => "Screwdriver",
            ToolKind::Wrench => "Wrench",
            ToolKind::OilCan => "Oil Can",
            ToolKind::CircuitBoard => "Circuit Board",
            ToolKind::CleaningBrush => "Cleaning Brush",
        }
    }

    /// Keyboard shortcut slot (1-based), `None` if out of range
    pub fn from_slot(slot: u8) -> Option<ToolKind> {
        Self::ALL.get(slot.checked_sub(1)? as usize).copied()
    }

    /// Cleaning sub-tool derived from the repair tool that engaged a dirty area
    pub fn cleaning_tool(&self) -> CleaningTool {
        match self {
            ToolKind::OilCan => CleaningTool::Spray,
            _ => CleaningTool::Brush,
        }
    }
}

/// Sub-tool used inside an active cleaning stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningTool {
    Spray,
    Brush,
}

/// Texture drawn under the dirt overlay while scrubbing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubTexture {
    Casing,
    Gears,
    Lens,
    Plate,
    Circuit,
}

/// A single malfunction, consumed from the external problem generator
///
/// Created once at session init, mutated only by marking fixed, never
/// removed for the session's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: u32,
    pub component: ComponentKind,
    #[serde(rename = "type")]
    pub kind: ProblemKind,
    /// Severity 1-3; scales repair duration and initial dirt
    pub severity: u8,
    pub required_tool: ToolKind,
    #[serde(default)]
    pub is_fixed: bool,
}

/// Axis-aligned clickable region on the pet
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec2,
    pub half_extent: Vec2,
}

impl Bounds {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_extent: size * 0.5,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let d = point - self.center;
        d.x.abs() <= self.half_extent.x && d.y.abs() <= self.half_extent.y
    }
}

/// Repair lifecycle for one area - a start stamp against the session clock,
/// never a per-area timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RepairState {
    NotStarted,
    InProgress { started_at_ms: f32 },
    Fixed,
}

/// The mutable per-problem record tracking progress, fix state, and bounds
#[derive(Debug, Clone)]
pub struct RepairArea {
    pub id: u32,
    pub problem: Problem,
    pub bounds: Bounds,
    pub is_highlighted: bool,
    pub repair: RepairState,
    /// 0-100; invariant: fixed implies exactly 100
    pub progress: f32,
    /// Visual effects currently anchored to this area
    pub effects: Vec<u32>,
}

impl RepairArea {
    pub fn new(id: u32, problem: Problem, bounds: Bounds) -> Self {
        Self {
            id,
            problem,
            bounds,
            is_highlighted: false,
            repair: RepairState::NotStarted,
            progress: 0.0,
            effects: Vec::new(),
        }
    }

    pub fn required_tool(&self) -> ToolKind {
        self.problem.required_tool
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.repair, RepairState::Fixed)
    }

    pub fn is_being_repaired(&self) -> bool {
        matches!(self.repair, RepairState::InProgress { .. })
    }

    /// Mark this area fixed, pinning progress and the owned problem flag
    pub fn mark_fixed(&mut self) {
        self.repair = RepairState::Fixed;
        self.problem.is_fixed = true;
        self.progress = 100.0;
        self.is_highlighted = false;
    }
}

/// Owns one `RepairArea` per problem for the session lifetime
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    areas: Vec<RepairArea>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, area: RepairArea) {
        self.areas.push(area);
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&RepairArea> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut RepairArea> {
        self.areas.iter_mut().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepairArea> {
        self.areas.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RepairArea> {
        self.areas.iter_mut()
    }

    /// Topmost unfixed-first hit test (later areas sit above earlier ones)
    pub fn area_at(&self, point: Vec2) -> Option<u32> {
        self.areas
            .iter()
            .rev()
            .find(|a| a.bounds.contains(point))
            .map(|a| a.id)
    }

    /// Authoritative fixed count - a scan, not a maintained counter
    pub fn fixed_count(&self) -> usize {
        self.areas.iter().filter(|a| a.is_fixed()).count()
    }

    pub fn all_fixed(&self) -> bool {
        self.areas.iter().all(|a| a.is_fixed())
    }

    pub fn clear(&mut self) {
        self.areas.clear();
    }
}

/// A tool slot on the palette
#[derive(Debug, Clone)]
pub struct Tool {
    pub kind: ToolKind,
    pub is_selected: bool,
    pub is_unlocked: bool,
    /// Palette hit-test region
    pub bounds: Bounds,
}

/// Palette x-center and vertical layout for tool hit testing
const PALETTE_X: f32 = 44.0;
const PALETTE_TOP: f32 = 70.0;
const PALETTE_STEP: f32 = 72.0;
const PALETTE_SLOT: f32 = 56.0;

/// The five-tool palette; at most one tool selected at a time
#[derive(Debug, Clone)]
pub struct ToolRack {
    tools: Vec<Tool>,
}

impl Default for ToolRack {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRack {
    /// Standard rack: all five tools, all unlocked, laid out down the left edge
    pub fn standard() -> Self {
        let tools = ToolKind::ALL
            .iter()
            .enumerate()
            .map(|(i, &kind)| Tool {
                kind,
                is_selected: false,
                is_unlocked: true,
                bounds: Bounds::new(
                    Vec2::new(PALETTE_X, PALETTE_TOP + i as f32 * PALETTE_STEP),
                    Vec2::splat(PALETTE_SLOT),
                ),
            })
            .collect();
        Self { tools }
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Tool> {
        self.tools.iter().find(|t| t.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    pub fn selected(&self) -> Option<ToolKind> {
        self.tools.iter().find(|t| t.is_selected).map(|t| t.kind)
    }

    /// Select a tool, deselecting every other. Returns false (no state
    /// change) when the tool is unknown to the rack or still locked.
    pub fn select(&mut self, kind: ToolKind) -> bool {
        match self.tools.iter().find(|t| t.kind == kind) {
            Some(tool) if tool.is_unlocked => {}
            _ => return false,
        }
        for tool in &mut self.tools {
            tool.is_selected = tool.kind == kind;
        }
        true
    }

    /// Next unlocked tool after the current selection (wraps; Tab cycling)
    pub fn next_unlocked(&self) -> Option<ToolKind> {
        let start = self
            .tools
            .iter()
            .position(|t| t.is_selected)
            .map(|i| i + 1)
            .unwrap_or(0);
        (0..self.tools.len())
            .map(|offset| &self.tools[(start + offset) % self.tools.len()])
            .find(|t| t.is_unlocked)
            .map(|t| t.kind)
    }

    /// Lock or unlock a tool slot (host-driven; locked tools ignore selection)
    pub fn set_unlocked(&mut self, kind: ToolKind, unlocked: bool) {
        if let Some(tool) = self.tools.iter_mut().find(|t| t.kind == kind) {
            tool.is_unlocked = unlocked;
            if !unlocked {
                tool.is_selected = false;
            }
        }
    }

    /// Palette hit test
    pub fn tool_at(&self, point: Vec2) -> Option<ToolKind> {
        self.tools
            .iter()
            .find(|t| t.bounds.contains(point))
            .map(|t| t.kind)
    }
}

/// The mutually-exclusive cleaning sub-simulation for DIRTY problems
#[derive(Debug, Clone)]
pub struct CleaningStage {
    pub area_id: u32,
    pub tool: CleaningTool,
    pub texture: ScrubTexture,
    /// 0-100, monotonically non-increasing while active
    pub dirt_level: f32,
    /// 0-100, monotonically non-decreasing while active
    pub progress: f32,
    /// Milliseconds since the last bubble burst
    pub since_bubbles_ms: f32,
}

impl CleaningStage {
    /// Dirt still visible, used to scale cleaning audio intensity
    pub fn remaining_dirt(&self) -> f32 {
        self.dirt_level * (1.0 - self.progress / 100.0)
    }
}

/// Current phase of a repair session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Building areas and the tool rack
    Initializing,
    /// Player is diagnosing and repairing
    InProgress,
    /// All problems fixed this tick; celebration + report in flight
    Completing,
    /// Completion reported, session is read-only
    Complete,
}

/// Attempt counters and timing for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_problems: usize,
    pub attempts: u32,
    pub correct_tool_usages: u32,
    pub incorrect_tool_usages: u32,
    pub cleaning_stages_completed: u32,
    pub elapsed_ms: f32,
    /// One-way flag; set exactly once when every problem is fixed
    pub is_complete: bool,
}

/// Simulation events drained once per tick into the feedback boundary
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ToolSelected {
        tool: ToolKind,
    },
    RepairStarted {
        area_id: u32,
        tool: ToolKind,
    },
    /// Progressive feedback while a standard repair advances
    RepairProgress {
        area_id: u32,
        percent: f32,
    },
    IncorrectTool {
        area_id: u32,
        attempted: ToolKind,
        required: ToolKind,
    },
    /// Second consecutive miss on one area: show the correct tool
    HintTriggered {
        area_id: u32,
        required: ToolKind,
    },
    AreaFixed {
        area_id: u32,
        component: ComponentKind,
    },
    CleaningStarted {
        area_id: u32,
        tool: CleaningTool,
    },
    CleaningTick {
        area_id: u32,
        tool: CleaningTool,
        remaining_dirt: f32,
    },
    CleaningComplete {
        area_id: u32,
    },
    SessionComplete,
}

/// RNG state wrapper so a session can be rebuilt reproducibly from its seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Complete mutable simulation state for one session
///
/// Owned exclusively by the session controller; collaborators only ever see
/// read-only snapshots.
#[derive(Debug)]
pub struct SessionState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub phase: SessionPhase,
    pub areas: AreaRegistry,
    pub rack: ToolRack,
    /// At most one active cleaning stage per session
    pub cleaning: Option<CleaningStage>,
    pub effects: EffectsEngine,
    pub stats: SessionStats,
    /// Per-tick event buffer, drained by the controller
    pub events: Vec<SimEvent>,
    /// (area id, consecutive incorrect attempts) for the hint threshold
    pub miss_streak: Option<(u32, u32)>,
}

impl SessionState {
    pub fn new(seed: u64, max_particles: usize) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            seed,
            effects: EffectsEngine::new(rng_state.to_rng(), max_particles),
            rng_state,
            phase: SessionPhase::Initializing,
            areas: AreaRegistry::new(),
            rack: ToolRack::standard(),
            cleaning: None,
            stats: SessionStats::default(),
            events: Vec::new(),
            miss_streak: None,
        }
    }

    pub fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Fixed-problem count, recomputed from the registry every call
    pub fn fixed_problems(&self) -> usize {
        self.areas.fixed_count()
    }
}
