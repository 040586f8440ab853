//! Audio/haptics feedback boundary
//!
//! Every simulation event maps to exactly one call on the external
//! collaborator, with an intensity derived from simulation state. Calls are
//! fire-and-forget: a collaborator error is caught and logged right here and
//! never reaches the simulation.

use std::fmt;

use crate::settings::Settings;
use crate::sim::state::{CleaningTool, SimEvent};

/// Error surfaced by an audio/haptics collaborator
#[derive(Debug, Clone)]
pub struct FeedbackError(pub String);

impl fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FeedbackError {}

pub type FeedbackResult = Result<(), FeedbackError>;

/// External audio/haptics collaborator
///
/// Implementations may fail (a suspended audio context, a missing haptics
/// motor); the coordinator swallows those failures.
pub trait AudioHaptics {
    fn play_sound(&mut self, id: &str, volume: f32) -> FeedbackResult;
    fn play_tool_select(&mut self, intensity: f32) -> FeedbackResult;
    fn play_repair_action(&mut self, intensity: f32) -> FeedbackResult;
    fn play_repair_success(&mut self, intensity: f32) -> FeedbackResult;
    fn play_cleaning_audio(&mut self, tool: CleaningTool, intensity: f32) -> FeedbackResult;
    fn play_progressive_repair_feedback(
        &mut self,
        percent: f32,
        max_intensity: f32,
    ) -> FeedbackResult;
}

/// Silent sink for tests and headless runs
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioHaptics for NullAudio {
    fn play_sound(&mut self, _id: &str, _volume: f32) -> FeedbackResult {
        Ok(())
    }
    fn play_tool_select(&mut self, _intensity: f32) -> FeedbackResult {
        Ok(())
    }
    fn play_repair_action(&mut self, _intensity: f32) -> FeedbackResult {
        Ok(())
    }
    fn play_repair_success(&mut self, _intensity: f32) -> FeedbackResult {
        Ok(())
    }
    fn play_cleaning_audio(&mut self, _tool: CleaningTool, _intensity: f32) -> FeedbackResult {
        Ok(())
    }
    fn play_progressive_repair_feedback(
        &mut self,
        _percent: f32,
        _max_intensity: f32,
    ) -> FeedbackResult {
        Ok(())
    }
}

/// Minimum cleaning-audio intensity so scrubbing stays audible on the last
/// patch of dirt
const CLEANING_INTENSITY_FLOOR: f32 = 0.15;

/// Translates simulation events into collaborator calls, isolating failures
pub struct FeedbackCoordinator {
    sink: Box<dyn AudioHaptics>,
}

impl FeedbackCoordinator {
    pub fn new(sink: Box<dyn AudioHaptics>) -> Self {
        Self { sink }
    }

    /// Map one simulation event to exactly one collaborator call.
    ///
    /// Errors are logged and dropped; simulation state is never touched.
    pub fn handle(&mut self, event: &SimEvent, settings: &Settings) {
        let volume = settings.effective_volume();
        if volume <= 0.0 {
            return;
        }

        let result = match event {
            SimEvent::ToolSelected { .. } => self.sink.play_tool_select(volume),
            SimEvent::RepairStarted { .. } => self.sink.play_repair_action(volume),
            SimEvent::RepairProgress { percent, .. } => self.sink.play_progressive_repair_feedback(
                *percent,
                settings.age_group.feedback_max_intensity() * volume,
            ),
            SimEvent::IncorrectTool { .. } => self.sink.play_sound("incorrect_tool", volume * 0.6),
            SimEvent::HintTriggered { .. } => self.sink.play_sound("hint_chime", volume * 0.5),
            SimEvent::AreaFixed { .. } => self.sink.play_repair_success(volume),
            SimEvent::CleaningStarted { tool, .. } => self.sink.play_cleaning_audio(*tool, volume),
            SimEvent::CleaningTick {
                tool,
                remaining_dirt,
                ..
            } => {
                let intensity = (remaining_dirt / 100.0).max(CLEANING_INTENSITY_FLOOR) * volume;
                self.sink.play_cleaning_audio(*tool, intensity)
            }
            SimEvent::CleaningComplete { .. } => self.sink.play_sound("cleaning_done", volume),
            SimEvent::SessionComplete => self.sink.play_sound("celebration_fanfare", volume),
        };

        if let Err(err) = result {
            log::warn!("audio/haptics collaborator failed ({event:?}): {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every call; optionally fails each one
    struct RecordingAudio {
        calls: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl AudioHaptics for RecordingAudio {
        fn play_sound(&mut self, id: &str, _volume: f32) -> FeedbackResult {
            self.calls.borrow_mut().push(format!("sound:{id}"));
            self.outcome()
        }
        fn play_tool_select(&mut self, _intensity: f32) -> FeedbackResult {
            self.calls.borrow_mut().push("tool_select".into());
            self.outcome()
        }
        fn play_repair_action(&mut self, _intensity: f32) -> FeedbackResult {
            self.calls.borrow_mut().push("repair_action".into());
            self.outcome()
        }
        fn play_repair_success(&mut self, _intensity: f32) -> FeedbackResult {
            self.calls.borrow_mut().push("repair_success".into());
            self.outcome()
        }
        fn play_cleaning_audio(&mut self, _tool: CleaningTool, intensity: f32) -> FeedbackResult {
            self.calls.borrow_mut().push(format!("cleaning:{intensity:.2}"));
            self.outcome()
        }
        fn play_progressive_repair_feedback(
            &mut self,
            percent: f32,
            _max_intensity: f32,
        ) -> FeedbackResult {
            self.calls.borrow_mut().push(format!("progress:{percent:.0}"));
            self.outcome()
        }
    }

    impl RecordingAudio {
        fn outcome(&self) -> FeedbackResult {
            if self.fail {
                Err(FeedbackError("synthetic failure".into()))
            } else {
                Ok(())
            }
        }
    }

    fn coordinator(fail: bool) -> (FeedbackCoordinator, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = RecordingAudio {
            calls: Rc::clone(&calls),
            fail,
        };
        (FeedbackCoordinator::new(Box::new(sink)), calls)
    }

    #[test]
    fn test_each_event_maps_to_one_call() {
        let (mut coordinator, calls) = coordinator(false);
        let settings = Settings::default();
        use crate::sim::state::ToolKind;

        let events = [
            SimEvent::ToolSelected {
                tool: ToolKind::Wrench,
            },
            SimEvent::RepairProgress {
                area_id: 1,
                percent: 40.0,
            },
            SimEvent::CleaningTick {
                area_id: 1,
                tool: CleaningTool::Brush,
                remaining_dirt: 50.0,
            },
            SimEvent::SessionComplete,
        ];
        for event in &events {
            coordinator.handle(event, &settings);
        }
        assert_eq!(calls.borrow().len(), events.len());
    }

    #[test]
    fn test_cleaning_intensity_scales_with_remaining_dirt() {
        let (mut coordinator, calls) = coordinator(false);
        let mut settings = Settings::default();
        settings.master_volume = 1.0;
        settings.sfx_volume = 1.0;

        coordinator.handle(
            &SimEvent::CleaningTick {
                area_id: 1,
                tool: CleaningTool::Spray,
                remaining_dirt: 80.0,
            },
            &settings,
        );
        coordinator.handle(
            &SimEvent::CleaningTick {
                area_id: 1,
                tool: CleaningTool::Spray,
                remaining_dirt: 0.0,
            },
            &settings,
        );
        let calls = calls.borrow();
        assert_eq!(calls[0], "cleaning:0.80");
        // Floor keeps the scrub audible on the last patch
        assert_eq!(calls[1], "cleaning:0.15");
    }

    #[test]
    fn test_collaborator_failure_is_swallowed() {
        let (mut coordinator, calls) = coordinator(true);
        let settings = Settings::default();
        coordinator.handle(&SimEvent::SessionComplete, &settings);
        // The call happened, the error went to the log, nothing panicked
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_muted_settings_skip_the_collaborator() {
        let (mut coordinator, calls) = coordinator(false);
        let mut settings = Settings::default();
        settings.master_volume = 0.0;
        coordinator.handle(&SimEvent::SessionComplete, &settings);
        assert!(calls.borrow().is_empty());
    }
}
