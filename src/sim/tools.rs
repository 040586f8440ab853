//! Tool selection and repair-attempt validation

use log::debug;

use super::effects::EffectKind;
use super::state::{ProblemKind, SessionState, SimEvent, ToolKind};
use super::{cleaning, repair};
use crate::consts::HINT_MISS_THRESHOLD;

/// Select a tool on the palette.
///
/// Unknown or locked tools are silently ignored. A successful selection
/// deselects every other tool and re-highlights exactly the unfixed areas
/// whose required tool matches. Idempotent for repeated same-tool calls.
pub fn select_tool(state: &mut SessionState, kind: ToolKind) {
    if !state.rack.select(kind) {
        debug!("ignoring selection of locked or unknown tool {:?}", kind);
        return;
    }
    for area in state.areas.iter_mut() {
        area.is_highlighted = !area.is_fixed() && area.required_tool() == kind;
    }
    state.push_event(SimEvent::ToolSelected { tool: kind });
}

/// Validate a click on a repair area with the currently selected tool.
///
/// No-op without a selected tool or on a fixed area. A correct tool starts
/// the matching simulator (cleaning for dirty problems, standard repair
/// otherwise); an incorrect tool spawns an error burst and, after
/// `HINT_MISS_THRESHOLD` consecutive misses on the same area, a hint event.
pub fn attempt_repair(state: &mut SessionState, area_id: u32) {
    let Some(selected) = state.rack.selected() else {
        return;
    };
    let (required, problem_kind, center, fixed) = match state.areas.get(area_id) {
        Some(area) => (
            area.required_tool(),
            area.problem.kind,
            area.bounds.center,
            area.is_fixed(),
        ),
        None => return,
    };
    if fixed {
        return;
    }

    state.stats.attempts += 1;

    if selected == required {
        state.stats.correct_tool_usages += 1;
        state.miss_streak = None;
        if problem_kind == ProblemKind::Dirty {
            cleaning::begin(state, area_id, selected);
        } else {
            repair::begin(state, area_id, selected);
        }
        return;
    }

    state.stats.incorrect_tool_usages += 1;
    if let Some(effect_id) = state.effects.spawn(EffectKind::Error, center, 1.0)
        && let Some(area) = state.areas.get_mut(area_id)
    {
        area.effects.push(effect_id);
    }
    state.push_event(SimEvent::IncorrectTool {
        area_id,
        attempted: selected,
        required,
    });

    let streak = match state.miss_streak {
        Some((id, count)) if id == area_id => count + 1,
        _ => 1,
    };
    if streak >= HINT_MISS_THRESHOLD {
        state.push_event(SimEvent::HintTriggered { area_id, required });
        // Start counting fresh once the hand has been shown
        state.miss_streak = None;
    } else {
        state.miss_streak = Some((area_id, streak));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{
        Bounds, ComponentKind, Problem, RepairArea, RepairState, SessionPhase,
    };
    use glam::Vec2;

    fn problem(id: u32, kind: ProblemKind, tool: ToolKind) -> Problem {
        Problem {
            id,
            component: ComponentKind::PowerCore,
            kind,
            severity: 2,
            required_tool: tool,
            is_fixed: false,
        }
    }

    fn state_with_areas(problems: Vec<Problem>) -> SessionState {
        let mut state = SessionState::new(1, crate::consts::MAX_PARTICLES);
        for (i, p) in problems.into_iter().enumerate() {
            let bounds = Bounds::new(Vec2::new(200.0 + i as f32 * 120.0, 200.0), Vec2::splat(80.0));
            state
                .areas
                .push(RepairArea::new(i as u32 + 1, p, bounds));
        }
        state.stats.total_problems = state.areas.len();
        state.phase = SessionPhase::InProgress;
        state
    }

    #[test]
    fn test_select_tool_highlights_exactly_matching_unfixed_areas() {
        let mut state = state_with_areas(vec![
            problem(1, ProblemKind::Broken, ToolKind::Wrench),
            problem(2, ProblemKind::Broken, ToolKind::Screwdriver),
            problem(3, ProblemKind::Broken, ToolKind::Wrench),
        ]);
        state.areas.get_mut(3).unwrap().mark_fixed();

        select_tool(&mut state, ToolKind::Wrench);

        let highlighted: Vec<u32> = state
            .areas
            .iter()
            .filter(|a| a.is_highlighted)
            .map(|a| a.id)
            .collect();
        assert_eq!(highlighted, vec![1]);
    }

    #[test]
    fn test_select_tool_is_idempotent() {
        let mut state = state_with_areas(vec![problem(1, ProblemKind::Broken, ToolKind::Wrench)]);
        select_tool(&mut state, ToolKind::Wrench);
        let first: Vec<bool> = state.areas.iter().map(|a| a.is_highlighted).collect();
        select_tool(&mut state, ToolKind::Wrench);
        let second: Vec<bool> = state.areas.iter().map(|a| a.is_highlighted).collect();
        assert_eq!(first, second);
        assert_eq!(state.rack.selected(), Some(ToolKind::Wrench));
    }

    #[test]
    fn test_attempt_without_tool_is_a_no_op() {
        let mut state = state_with_areas(vec![problem(1, ProblemKind::Broken, ToolKind::Wrench)]);
        attempt_repair(&mut state, 1);
        assert_eq!(state.stats.attempts, 0);
        assert_eq!(state.areas.get(1).unwrap().repair, RepairState::NotStarted);
    }

    #[test]
    fn test_correct_tool_starts_repair() {
        let mut state = state_with_areas(vec![problem(1, ProblemKind::Broken, ToolKind::Wrench)]);
        select_tool(&mut state, ToolKind::Wrench);
        attempt_repair(&mut state, 1);
        assert_eq!(state.stats.attempts, 1);
        assert_eq!(state.stats.correct_tool_usages, 1);
        assert!(state.areas.get(1).unwrap().is_being_repaired());
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::RepairStarted { area_id: 1, .. })));
    }

    #[test]
    fn test_correct_tool_on_dirty_problem_starts_cleaning() {
        let mut state = state_with_areas(vec![problem(1, ProblemKind::Dirty, ToolKind::OilCan)]);
        select_tool(&mut state, ToolKind::OilCan);
        attempt_repair(&mut state, 1);
        assert!(state.cleaning.is_some());
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::CleaningStarted { area_id: 1, .. })));
    }

    #[test]
    fn test_incorrect_tool_only_counts_and_sparks_an_error() {
        let mut state = state_with_areas(vec![problem(1, ProblemKind::Broken, ToolKind::Wrench)]);
        select_tool(&mut state, ToolKind::Screwdriver);
        attempt_repair(&mut state, 1);

        let area = state.areas.get(1).unwrap();
        assert_eq!(state.stats.incorrect_tool_usages, 1);
        assert_eq!(area.progress, 0.0);
        assert!(!area.is_fixed());
        assert_eq!(area.repair, RepairState::NotStarted);
        assert_eq!(state.effects.effects().len(), 1);
        assert_eq!(state.effects.effects()[0].kind, EffectKind::Error);
    }

    #[test]
    fn test_hint_after_second_consecutive_miss_on_same_area() {
        let mut state = state_with_areas(vec![problem(1, ProblemKind::Broken, ToolKind::Wrench)]);
        select_tool(&mut state, ToolKind::Screwdriver);

        attempt_repair(&mut state, 1);
        assert!(!state
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::HintTriggered { .. })));

        attempt_repair(&mut state, 1);
        assert!(state.events.iter().any(|e| matches!(
            e,
            SimEvent::HintTriggered {
                area_id: 1,
                required: ToolKind::Wrench
            }
        )));
        // Streak restarts after the hand is shown
        assert_eq!(state.miss_streak, None);
    }

    #[test]
    fn test_miss_streak_resets_on_different_area() {
        let mut state = state_with_areas(vec![
            problem(1, ProblemKind::Broken, ToolKind::Wrench),
            problem(2, ProblemKind::Broken, ToolKind::Wrench),
        ]);
        select_tool(&mut state, ToolKind::Screwdriver);
        attempt_repair(&mut state, 1);
        attempt_repair(&mut state, 2);
        assert!(!state
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::HintTriggered { .. })));
        assert_eq!(state.miss_streak, Some((2, 1)));
    }

    #[test]
    fn test_attempt_on_fixed_area_is_a_no_op() {
        let mut state = state_with_areas(vec![problem(1, ProblemKind::Broken, ToolKind::Wrench)]);
        state.areas.get_mut(1).unwrap().mark_fixed();
        select_tool(&mut state, ToolKind::Wrench);
        let attempts_before = state.stats.attempts;
        attempt_repair(&mut state, 1);
        assert_eq!(state.stats.attempts, attempts_before);
        assert_eq!(state.areas.get(1).unwrap().progress, 100.0);
    }
}
