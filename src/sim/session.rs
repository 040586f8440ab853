//! Session orchestration
//!
//! Initialization, the per-frame tick, and one-shot completion reporting.
//! The session owns every piece of mutable simulation state for its
//! lifetime; collaborators only ever receive events or read-only snapshots.

use std::fmt;

use glam::Vec2;
use log::info;
use serde::Serialize;

use crate::collab::{GestureId, GuidanceOverlay, PetBody, ProgressTracker};
use crate::consts::HINT_GESTURE_MS;
use crate::feedback::FeedbackCoordinator;
use crate::settings::Settings;

use super::state::{
    Bounds, CleaningTool, ComponentKind, Problem, ProblemKind, RepairArea, ScrubTexture,
    SessionPhase, SessionState, SimEvent, ToolKind,
};
use super::{cleaning, repair, tools};

/// Clickable footprint of a repair area on the pet
const AREA_SIZE: Vec2 = Vec2::new(96.0, 72.0);

/// Input commands for a single tick.
///
/// One-shot flags: the host clears them after each processed tick, like any
/// edge-triggered input.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer-down position (tool palette hit or area click)
    pub pointer: Option<Vec2>,
    /// Keyboard tool selection (shortcuts 1-5)
    pub select_tool: Option<ToolKind>,
    /// H: point the guiding hand at the tool for the next unfixed area
    pub hint: bool,
    /// S: force-complete every unfixed area (accessibility escape hatch)
    pub skip: bool,
    /// Tab: cycle selection to the next unlocked tool
    pub cycle_tool: bool,
}

impl TickInput {
    /// Map keyboard shortcuts: `1`..`5` select tools, `H` hint, `S` skip,
    /// Tab cycles the palette
    pub fn from_key(key: char) -> Self {
        let mut input = Self::default();
        match key {
            '1'..='5' => input.select_tool = ToolKind::from_slot(key as u8 - b'0'),
            'h' | 'H' => input.hint = true,
            's' | 'S' => input.skip = true,
            '\t' => input.cycle_tool = true,
            _ => {}
        }
        input
    }
}

/// Fatal initialization failures; the session never enters `InProgress`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The problem generator handed us nothing to repair
    EmptyProblemList,
    /// The pet has no placement for this component, so no repair area
    /// can be positioned
    UnplaceableComponent(ComponentKind),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::EmptyProblemList => write!(f, "problem list is empty"),
            InitError::UnplaceableComponent(component) => {
                write!(f, "pet cannot place component {}", component.as_str())
            }
        }
    }
}

impl std::error::Error for InitError {}

/// Aggregate session progress. The fixed count is recomputed from the
/// registry at call time, never carried as its own counter.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub total_problems: usize,
    pub fixed_problems: usize,
    pub selected_tool: Option<ToolKind>,
    pub attempts: u32,
    pub correct_tool_usages: u32,
    pub incorrect_tool_usages: u32,
    pub cleaning_stages_completed: u32,
    pub elapsed_ms: f32,
    pub is_complete: bool,
}

/// Read-only per-frame view for the rendering collaborator
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub phase: SessionPhase,
    pub areas: Vec<AreaView>,
    pub tools: Vec<ToolView>,
    pub cleaning: Option<CleaningView>,
    pub effects: Vec<EffectView>,
    pub progress: ProgressReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaView {
    pub id: u32,
    pub component: ComponentKind,
    pub problem: ProblemKind,
    pub bounds: Bounds,
    pub highlighted: bool,
    pub being_repaired: bool,
    pub fixed: bool,
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolView {
    pub kind: ToolKind,
    pub label: &'static str,
    pub selected: bool,
    pub unlocked: bool,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleaningView {
    pub area_id: u32,
    pub tool: CleaningTool,
    pub texture: ScrubTexture,
    pub remaining_dirt: f32,
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub id: u32,
    pub kind: super::effects::EffectKind,
    pub particles: Vec<ParticleView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticleView {
    pub pos: Vec2,
    pub size: f32,
    pub color: u32,
    pub alpha: f32,
}

/// The repair session controller
pub struct RepairSession {
    state: SessionState,
    settings: Settings,
    feedback: FeedbackCoordinator,
    overlay: Box<dyn GuidanceOverlay>,
    tracker: Box<dyn ProgressTracker>,
    /// Guiding hand currently on screen (onboarding or hint)
    active_gesture: Option<GestureId>,
}

impl std::fmt::Debug for RepairSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairSession")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("active_gesture", &self.active_gesture)
            .finish_non_exhaustive()
    }
}

impl RepairSession {
    /// Build a session: one repair area per problem, positioned by the pet
    /// collaborator, plus the standard tool rack.
    pub fn new(
        pet: &dyn PetBody,
        problems: Vec<Problem>,
        settings: Settings,
        feedback: FeedbackCoordinator,
        overlay: Box<dyn GuidanceOverlay>,
        tracker: Box<dyn ProgressTracker>,
        seed: u64,
    ) -> Result<Self, InitError> {
        if problems.is_empty() {
            return Err(InitError::EmptyProblemList);
        }

        let mut state = SessionState::new(seed, settings.max_particles());
        for (index, problem) in problems.into_iter().enumerate() {
            let anchor = pet
                .placement_of(problem.component)
                .ok_or(InitError::UnplaceableComponent(problem.component))?;
            let area = RepairArea::new(index as u32 + 1, problem, Bounds::new(anchor, AREA_SIZE));
            state.areas.push(area);
        }
        state.stats.total_problems = state.areas.len();
        state.phase = SessionPhase::InProgress;
        info!(
            "repair session started: {} problems, seed {}",
            state.stats.total_problems, seed
        );

        let mut session = Self {
            state,
            settings,
            feedback,
            overlay,
            tracker,
            active_gesture: None,
        };

        // Initial guidance: a tap hand over the first malfunction
        let first_center = session
            .state
            .areas
            .iter()
            .next()
            .map(|area| area.bounds.center);
        if let Some(at) = first_center {
            session.active_gesture = Some(session.overlay.show_tap_gesture(at, HINT_GESTURE_MS));
        }

        Ok(session)
    }

    /// Advance the session by one frame.
    ///
    /// Within one tick, effects update before completion detection so a
    /// just-completed area's success burst is visible starting the frame
    /// that produced it.
    pub fn update(&mut self, input: &TickInput, dt_ms: f32) {
        match self.state.phase {
            SessionPhase::InProgress => {}
            SessionPhase::Completing | SessionPhase::Complete => {
                // Post-completion ticks only age the celebration; the
                // one-way flag keeps the external report from ever refiring.
                self.state.phase = SessionPhase::Complete;
                self.state.effects.update(dt_ms);
                self.prune_expired_effects();
                return;
            }
            SessionPhase::Initializing => return,
        }

        self.state.stats.elapsed_ms += dt_ms;

        self.apply_input(input);

        self.state.effects.update(dt_ms);
        self.prune_expired_effects();

        repair::tick(&mut self.state);
        cleaning::tick(
            &mut self.state,
            dt_ms,
            self.settings.age_group.cleaning_speed(),
        );

        self.detect_completion();
        self.dispatch_events();
    }

    fn apply_input(&mut self, input: &TickInput) {
        if let Some(kind) = input.select_tool {
            tools::select_tool(&mut self.state, kind);
        }
        if input.cycle_tool
            && let Some(next) = self.state.rack.next_unlocked()
        {
            tools::select_tool(&mut self.state, next);
        }
        if let Some(at) = input.pointer {
            if let Some(kind) = self.state.rack.tool_at(at) {
                tools::select_tool(&mut self.state, kind);
            } else if let Some(area_id) = self.state.areas.area_at(at) {
                tools::attempt_repair(&mut self.state, area_id);
            }
        }
        if input.hint {
            self.queue_manual_hint();
        }
        if input.skip {
            self.skip_remaining();
        }
    }

    /// H shortcut: hint toward the first unfixed malfunction
    fn queue_manual_hint(&mut self) {
        let next = self
            .state
            .areas
            .iter()
            .find(|a| !a.is_fixed())
            .map(|a| (a.id, a.required_tool()));
        if let Some((area_id, required)) = next {
            self.state.push_event(SimEvent::HintTriggered { area_id, required });
        }
    }

    /// S shortcut: force every unfixed area through the normal completion
    /// path, so effect spawning and exactly-once reporting still hold
    fn skip_remaining(&mut self) {
        let unfixed: Vec<u32> = self
            .state
            .areas
            .iter()
            .filter(|a| !a.is_fixed())
            .map(|a| a.id)
            .collect();
        if unfixed.is_empty() {
            return;
        }
        info!("skip requested: force-completing {} areas", unfixed.len());
        self.state.cleaning = None;
        for area_id in unfixed {
            repair::complete_area(&mut self.state, area_id);
        }
    }

    /// Drop area references to effects the engine has retired
    fn prune_expired_effects(&mut self) {
        let live: Vec<u32> = self
            .state
            .effects
            .effects()
            .iter()
            .map(|e| e.id)
            .collect();
        for area in self.state.areas.iter_mut() {
            area.effects.retain(|id| live.contains(id));
        }
    }

    /// Completion fires at most once per session, guarded by the one-way
    /// `is_complete` flag; the fixed count is an authoritative registry scan.
    fn detect_completion(&mut self) {
        if self.state.stats.is_complete {
            return;
        }
        if self.state.fixed_problems() < self.state.stats.total_problems {
            return;
        }

        self.state.phase = SessionPhase::Completing;
        self.state.stats.is_complete = true;

        self.state.effects.spawn_celebration(1.0);
        self.state.push_event(SimEvent::SessionComplete);
        self.overlay.hide_all_guiding_hands();
        self.active_gesture = None;

        let fixed_ids: Vec<u32> = self.state.areas.iter().map(|a| a.problem.id).collect();
        self.tracker
            .record_repair_completed(self.state.stats.elapsed_ms as u64, &fixed_ids);

        self.state.phase = SessionPhase::Complete;
        info!(
            "session complete: {} problems fixed in {:.0} ms",
            fixed_ids.len(),
            self.state.stats.elapsed_ms
        );
    }

    /// Drain the tick's events into the feedback boundary and the overlay
    fn dispatch_events(&mut self) {
        let events = std::mem::take(&mut self.state.events);
        for event in &events {
            match event {
                SimEvent::HintTriggered { required, .. } => {
                    if let Some(at) = self.state.rack.get(*required).map(|t| t.bounds.center) {
                        if let Some(previous) = self.active_gesture.take() {
                            self.overlay.hide_guiding_hand(previous);
                        }
                        self.active_gesture =
                            Some(self.overlay.show_tap_gesture(at, HINT_GESTURE_MS));
                    }
                }
                SimEvent::AreaFixed { .. } => {
                    if let Some(previous) = self.active_gesture.take() {
                        self.overlay.hide_guiding_hand(previous);
                    }
                }
                _ => {}
            }
            self.feedback.handle(event, &self.settings);
        }
    }

    /// Synchronous teardown on session exit. No timers exist anywhere, so
    /// nothing can fire after this returns.
    pub fn shutdown(&mut self) {
        self.state.cleaning = None;
        self.state.effects.clear();
        self.state.areas.clear();
        self.overlay.hide_all_guiding_hands();
        self.active_gesture = None;
        info!("session torn down");
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn is_complete(&self) -> bool {
        self.state.stats.is_complete
    }

    /// Read-only access for tests and debugging tooling
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn progress(&self) -> ProgressReport {
        ProgressReport {
            total_problems: self.state.stats.total_problems,
            fixed_problems: self.state.fixed_problems(),
            selected_tool: self.state.rack.selected(),
            attempts: self.state.stats.attempts,
            correct_tool_usages: self.state.stats.correct_tool_usages,
            incorrect_tool_usages: self.state.stats.incorrect_tool_usages,
            cleaning_stages_completed: self.state.stats.cleaning_stages_completed,
            elapsed_ms: self.state.stats.elapsed_ms,
            is_complete: self.state.stats.is_complete,
        }
    }

    /// Per-frame view for the rendering collaborator; never exposes
    /// mutable simulation state
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            phase: self.state.phase,
            areas: self
                .state
                .areas
                .iter()
                .map(|a| AreaView {
                    id: a.id,
                    component: a.problem.component,
                    problem: a.problem.kind,
                    bounds: a.bounds,
                    highlighted: a.is_highlighted,
                    being_repaired: a.is_being_repaired(),
                    fixed: a.is_fixed(),
                    progress: a.progress,
                })
                .collect(),
            tools: self
                .state
                .rack
                .iter()
                .map(|t| ToolView {
                    kind: t.kind,
                    label: t.kind.label(),
                    selected: t.is_selected,
                    unlocked: t.is_unlocked,
                    bounds: t.bounds,
                })
                .collect(),
            cleaning: self.state.cleaning.as_ref().map(|stage| CleaningView {
                area_id: stage.area_id,
                tool: stage.tool,
                texture: stage.texture,
                remaining_dirt: stage.remaining_dirt(),
                progress: stage.progress,
            }),
            effects: self
                .state
                .effects
                .effects()
                .iter()
                .map(|e| EffectView {
                    id: e.id,
                    kind: e.kind,
                    particles: e
                        .particles
                        .iter()
                        .map(|p| ParticleView {
                            pos: p.pos,
                            size: p.size,
                            color: p.color,
                            alpha: p.alpha(),
                        })
                        .collect(),
                })
                .collect(),
            progress: self.progress(),
        }
    }
}
