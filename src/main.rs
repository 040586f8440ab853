//! Robo Fixit entry point
//!
//! Headless driver: loads a problem list (JSON file argument, or a built-in
//! demo set), then plays a scripted session to completion at a fixed
//! timestep and prints the final progress report.

use robo_fixit::Settings;
use robo_fixit::collab::{NullOverlay, ProgressTracker, RiggedPet};
use robo_fixit::consts::SIM_DT_MS;
use robo_fixit::feedback::{FeedbackCoordinator, NullAudio};
use robo_fixit::sim::{
    ComponentKind, Problem, ProblemKind, RepairSession, SessionPhase, TickInput, ToolKind,
};

/// Safety cap so a malformed problem list can never spin forever
const MAX_TICKS: usize = 120_000;

fn demo_problems() -> Vec<Problem> {
    vec![
        Problem {
            id: 1,
            component: ComponentKind::PowerCore,
            kind: ProblemKind::LowPower,
            severity: 2,
            required_tool: ToolKind::CircuitBoard,
            is_fixed: false,
        },
        Problem {
            id: 2,
            component: ComponentKind::ChassisPlating,
            kind: ProblemKind::Dirty,
            severity: 3,
            required_tool: ToolKind::OilCan,
            is_fixed: false,
        },
        Problem {
            id: 3,
            component: ComponentKind::MotorSystem,
            kind: ProblemKind::Broken,
            severity: 1,
            required_tool: ToolKind::Wrench,
            is_fixed: false,
        },
    ]
}

/// Tracker that logs the one completion report
#[derive(Default)]
struct LoggingTracker;

impl ProgressTracker for LoggingTracker {
    fn record_repair_completed(&mut self, elapsed_ms: u64, fixed_problem_ids: &[u32]) {
        log::info!(
            "progress tracker: repair completed in {} ms, problems {:?}",
            elapsed_ms,
            fixed_problem_ids
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let problems: Vec<Problem> = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => demo_problems(),
    };

    let pet = RiggedPet::standard();
    let mut session = RepairSession::new(
        &pet,
        problems,
        Settings::default(),
        FeedbackCoordinator::new(Box::new(NullAudio)),
        Box::new(NullOverlay::default()),
        Box::new(LoggingTracker),
        0xF1C5,
    )?;

    // Scripted player: for each malfunction in turn, pick its required tool
    // and tap the area, then let the simulation run until it fixes.
    let mut ticks = 0usize;
    while session.phase() != SessionPhase::Complete && ticks < MAX_TICKS {
        let mut input = TickInput::default();
        let next = session
            .state()
            .areas
            .iter()
            .find(|a| !a.is_fixed())
            .map(|a| (a.id, a.required_tool(), a.bounds.center, a.is_being_repaired()));
        if let Some((_, required, center, being_repaired)) = next {
            if session.state().rack.selected() != Some(required) {
                input.select_tool = Some(required);
            } else if !being_repaired {
                input.pointer = Some(center);
            }
        }
        session.update(&input, SIM_DT_MS);
        ticks += 1;
    }

    let report = session.progress();
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_complete {
        return Err("session did not complete within the tick budget".into());
    }
    Ok(())
}
