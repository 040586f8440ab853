//! External collaborator interfaces
//!
//! The session owns all mutable simulation state; these traits are the
//! narrow seams it calls out through. Null implementations keep tests and
//! headless runs free of platform dependencies.

use glam::Vec2;

use crate::sim::state::ComponentKind;

/// Capability interface: anything that can report where it sits on screen.
///
/// Component fixtures implement this instead of being probed by runtime
/// type tests.
pub trait HasPlacement {
    fn placement(&self) -> Vec2;
}

/// Read-only view of the robot pet's body, used to position repair areas
pub trait PetBody {
    /// Screen-space anchor for a component, `None` if the pet lacks it
    fn placement_of(&self, component: ComponentKind) -> Option<Vec2>;
}

/// One mounted component with a screen anchor
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub component: ComponentKind,
    pub anchor: Vec2,
}

impl HasPlacement for Fixture {
    fn placement(&self) -> Vec2 {
        self.anchor
    }
}

/// A pet assembled from component fixtures. Placement queries go through the
/// `HasPlacement` capability of each fixture.
#[derive(Debug, Clone, Default)]
pub struct RiggedPet {
    fixtures: Vec<Fixture>,
}

impl RiggedPet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture(mut self, component: ComponentKind, anchor: Vec2) -> Self {
        self.fixtures.push(Fixture { component, anchor });
        self
    }

    /// Full five-component rig used by the demo driver and tests
    pub fn standard() -> Self {
        Self::new()
            .with_fixture(ComponentKind::PowerCore, Vec2::new(400.0, 330.0))
            .with_fixture(ComponentKind::MotorSystem, Vec2::new(330.0, 420.0))
            .with_fixture(ComponentKind::SensorArray, Vec2::new(400.0, 180.0))
            .with_fixture(ComponentKind::ChassisPlating, Vec2::new(480.0, 400.0))
            .with_fixture(ComponentKind::ProcessingUnit, Vec2::new(400.0, 250.0))
    }
}

impl PetBody for RiggedPet {
    fn placement_of(&self, component: ComponentKind) -> Option<Vec2> {
        self.fixtures
            .iter()
            .find(|f| f.component == component)
            .map(|f| f.placement())
    }
}

/// Handle for one guiding-hand gesture
pub type GestureId = u32;

/// Guidance overlay collaborator (tap hands for onboarding and hints)
pub trait GuidanceOverlay {
    fn show_tap_gesture(&mut self, at: Vec2, duration_ms: u32) -> GestureId;
    fn hide_guiding_hand(&mut self, id: GestureId);
    fn hide_all_guiding_hands(&mut self);
}

/// Overlay that tracks ids but draws nothing
#[derive(Debug, Default)]
pub struct NullOverlay {
    next_id: GestureId,
}

impl GuidanceOverlay for NullOverlay {
    fn show_tap_gesture(&mut self, _at: Vec2, _duration_ms: u32) -> GestureId {
        self.next_id += 1;
        self.next_id
    }
    fn hide_guiding_hand(&mut self, _id: GestureId) {}
    fn hide_all_guiding_hands(&mut self) {}
}

/// Progress-tracking collaborator, told exactly once when a session completes
pub trait ProgressTracker {
    fn record_repair_completed(&mut self, elapsed_ms: u64, fixed_problem_ids: &[u32]);
}

/// Tracker that drops the report
#[derive(Debug, Default)]
pub struct NullTracker;

impl ProgressTracker for NullTracker {
    fn record_repair_completed(&mut self, _elapsed_ms: u64, _fixed_problem_ids: &[u32]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rigged_pet_places_known_components() {
        let pet = RiggedPet::standard();
        for component in [
            ComponentKind::PowerCore,
            ComponentKind::MotorSystem,
            ComponentKind::SensorArray,
            ComponentKind::ChassisPlating,
            ComponentKind::ProcessingUnit,
        ] {
            assert!(pet.placement_of(component).is_some(), "{component:?}");
        }
    }

    #[test]
    fn test_partial_pet_reports_missing_components() {
        let pet = RiggedPet::new().with_fixture(ComponentKind::PowerCore, Vec2::ZERO);
        assert!(pet.placement_of(ComponentKind::PowerCore).is_some());
        assert_eq!(pet.placement_of(ComponentKind::MotorSystem), None);
    }
}
