//! Session settings and age-group tuning presets
//!
//! Everything here is plain data so a host shell can persist it however it
//! likes (the engine never touches storage itself).

use serde::{Deserialize, Serialize};

/// Player age-group preset
///
/// Tuning values only - no documented derivation beyond playtesting, so they
/// are preserved as named constants rather than re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AgeGroup {
    Young,
    #[default]
    Middle,
    Older,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Young => "Young",
            AgeGroup::Middle => "Middle",
            AgeGroup::Older => "Older",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "young" => Some(AgeGroup::Young),
            "middle" | "mid" => Some(AgeGroup::Middle),
            "older" | "old" => Some(AgeGroup::Older),
            _ => None,
        }
    }

    /// Cleaning progress gained per millisecond of active scrubbing.
    ///
    /// Younger players clean faster (a fixed higher constant) so the dirty
    /// stage never drags long enough to frustrate.
    pub fn cleaning_speed(&self) -> f32 {
        match self {
            AgeGroup::Young => 0.05,
            AgeGroup::Middle => 0.03,
            AgeGroup::Older => 0.02,
        }
    }

    /// Ceiling for progressive repair feedback intensity
    pub fn feedback_max_intensity(&self) -> f32 {
        match self {
            AgeGroup::Young => 1.0,
            AgeGroup::Middle => 0.8,
            AgeGroup::Older => 0.7,
        }
    }
}

/// Engine settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Age-group tuning preset
    pub age_group: AgeGroup,

    // === Visual effects ===
    /// Particle effects (sparks, bubbles, bursts)
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Haptic cues enabled
    pub haptics: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses decorative particle spawning)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            age_group: AgeGroup::Middle,
            particles: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            haptics: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings for an age group (applies preset defaults)
    pub fn for_age_group(age_group: AgeGroup) -> Self {
        Self {
            age_group,
            ..Self::default()
        }
    }

    /// Effective volume fed to the audio collaborator
    pub fn effective_volume(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    /// Effective live-particle cap (respects particles toggle + reduced motion)
    pub fn max_particles(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            crate::consts::MAX_PARTICLES
        }
    }
}
