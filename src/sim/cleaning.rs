//! Cleaning-stage simulation for dirty components
//!
//! A mutually-exclusive sub-state-machine: at most one stage is active per
//! session, progress accrues per tick at an age-group-dependent speed, and
//! completion folds into the same area-completion path as a standard repair.

use log::{debug, info};

use super::effects::EffectKind;
use super::repair;
use super::state::{CleaningStage, RepairState, SessionState, SimEvent, ToolKind};
use crate::clamp_percent;
use crate::consts::{BUBBLE_INTERVAL_MS, DIRT_BASE, DIRT_MAX, DIRT_MIN, DIRT_PER_SEVERITY};

/// Initial dirt for a problem: `severity * 30 + 10`, clamped to [40, 100]
pub fn initial_dirt(severity: u8) -> f32 {
    (severity as f32 * DIRT_PER_SEVERITY + DIRT_BASE).clamp(DIRT_MIN, DIRT_MAX)
}

/// Start a cleaning stage for a dirty area.
///
/// Starting while another stage is active is an invalid transition and is
/// ignored. The cleaning sub-tool derives from the repair tool that engaged
/// the area (oil can sprays, everything else brushes); the scrub texture
/// derives from the component.
pub fn begin(state: &mut SessionState, area_id: u32, tool: ToolKind) {
    if let Some(active) = &state.cleaning {
        debug!(
            "cleaning stage already active on area {}, ignoring start for area {}",
            active.area_id, area_id
        );
        return;
    }
    let now = state.stats.elapsed_ms;
    let Some(area) = state.areas.get_mut(area_id) else {
        return;
    };
    if area.is_fixed() {
        return;
    }
    area.repair = RepairState::InProgress { started_at_ms: now };

    let cleaning_tool = tool.cleaning_tool();
    let stage = CleaningStage {
        area_id,
        tool: cleaning_tool,
        texture: area.problem.component.scrub_texture(),
        dirt_level: initial_dirt(area.problem.severity),
        progress: 0.0,
        since_bubbles_ms: 0.0,
    };
    info!(
        "cleaning {} with {:?} (dirt {})",
        area.problem.component.as_str(),
        stage.tool,
        stage.dirt_level
    );
    state.cleaning = Some(stage);
    state.push_event(SimEvent::CleaningStarted {
        area_id,
        tool: cleaning_tool,
    });
}

/// Advance the active stage by `speed * dt` percent.
///
/// Emits a cleaning tick event (remaining dirt scales the audio), spawns
/// bubble bursts on a fixed cadence, and on reaching 100 retires the stage
/// through the shared area-completion path.
pub fn tick(state: &mut SessionState, dt_ms: f32, speed: f32) {
    let Some(stage) = state.cleaning.as_mut() else {
        return;
    };

    stage.progress = clamp_percent(stage.progress + speed * dt_ms);
    stage.since_bubbles_ms += dt_ms;

    let area_id = stage.area_id;
    let tool = stage.tool;
    let progress = stage.progress;
    let remaining_dirt = stage.remaining_dirt();
    let done = progress >= 100.0;
    let want_bubbles = !done && stage.since_bubbles_ms >= BUBBLE_INTERVAL_MS;
    if want_bubbles {
        stage.since_bubbles_ms = 0.0;
    }

    // Mirror progress onto the area so rendering and the fixed-implies-100
    // invariant both see one number
    let center = match state.areas.get_mut(area_id) {
        Some(area) => {
            area.progress = progress;
            area.bounds.center
        }
        None => return,
    };

    if want_bubbles
        && let Some(effect_id) =
            state
                .effects
                .spawn(EffectKind::CleaningBubbles, center, progress / 100.0)
        && let Some(area) = state.areas.get_mut(area_id)
    {
        area.effects.push(effect_id);
    }

    state.push_event(SimEvent::CleaningTick {
        area_id,
        tool,
        remaining_dirt,
    });

    if done {
        state.cleaning = None;
        state.stats.cleaning_stages_completed += 1;
        state.push_event(SimEvent::CleaningComplete { area_id });
        repair::complete_area(state, area_id);
    }
}
