//! Standard repair progress simulation
//!
//! Each in-progress area stores the session time at which its repair began;
//! every tick recomputes progress from that stamp against the session clock.
//! There are no per-area timers, so any number of concurrent repairs stay
//! consistent and teardown has nothing asynchronous to cancel.

use log::{debug, info};

use super::effects::EffectKind;
use super::state::{ProblemKind, RepairState, SessionState, SimEvent, ToolKind};
use crate::consts::{BASE_REPAIR_MS, SEVERITY_STEP_MS, SPARK_CHANCE_PER_TICK};
use crate::{clamp_percent, elapsed_ratio};

/// Repair duration scales linearly with severity (2.5-3.5 s)
pub fn duration_ms(severity: u8) -> f32 {
    BASE_REPAIR_MS + severity as f32 * SEVERITY_STEP_MS
}

/// Start a standard repair on an area.
///
/// A no-op if the repair is already running or the area is fixed, so a
/// repeated correct-tool click never restarts or rewinds progress.
pub fn begin(state: &mut SessionState, area_id: u32, tool: ToolKind) {
    let now = state.stats.elapsed_ms;
    let Some(area) = state.areas.get_mut(area_id) else {
        return;
    };
    if !matches!(area.repair, RepairState::NotStarted) {
        return;
    }
    area.repair = RepairState::InProgress { started_at_ms: now };
    debug!(
        "repair started on {} (severity {}, {} ms)",
        area.problem.component.as_str(),
        area.problem.severity,
        duration_ms(area.problem.severity)
    );
    state.push_event(SimEvent::RepairStarted { area_id, tool });
}

/// Advance every in-progress standard repair by recomputing elapsed/duration.
///
/// Dirty problems are skipped here - their progress is driven by the active
/// cleaning stage instead.
pub fn tick(state: &mut SessionState) {
    let now = state.stats.elapsed_ms;
    let mut progressing: Vec<(u32, f32, glam::Vec2)> = Vec::new();
    let mut completed: Vec<u32> = Vec::new();

    for area in state.areas.iter_mut() {
        let RepairState::InProgress { started_at_ms } = area.repair else {
            continue;
        };
        if area.problem.kind == ProblemKind::Dirty {
            continue;
        }
        let duration = duration_ms(area.problem.severity);
        let ratio = elapsed_ratio(now - started_at_ms, duration);
        area.progress = clamp_percent(ratio * 100.0);
        if area.progress >= 100.0 {
            completed.push(area.id);
        } else {
            progressing.push((area.id, area.progress, area.bounds.center));
        }
    }

    for (area_id, percent, center) in progressing {
        if state.effects.chance(SPARK_CHANCE_PER_TICK)
            && let Some(effect_id) =
                state
                    .effects
                    .spawn(EffectKind::Sparks, center, percent / 100.0)
            && let Some(area) = state.areas.get_mut(area_id)
        {
            area.effects.push(effect_id);
        }
        state.push_event(SimEvent::RepairProgress { area_id, percent });
    }

    for area_id in completed {
        complete_area(state, area_id);
    }
}

/// The single area-completion path, shared by standard repairs, finished
/// cleaning stages, and the skip escape hatch: pin progress at 100, mark
/// the problem fixed, spawn the success burst, emit the fixed event.
pub fn complete_area(state: &mut SessionState, area_id: u32) {
    let (center, component) = match state.areas.get_mut(area_id) {
        Some(area) if !area.is_fixed() => {
            area.mark_fixed();
            (area.bounds.center, area.problem.component)
        }
        _ => return,
    };
    if let Some(effect_id) = state.effects.spawn(EffectKind::SuccessBurst, center, 1.0)
        && let Some(area) = state.areas.get_mut(area_id)
    {
        area.effects.push(effect_id);
    }
    info!("{} fixed", component.as_str());
    state.push_event(SimEvent::AreaFixed { area_id, component });
}
