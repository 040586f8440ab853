//! Particle-based visual effects
//!
//! Effects are timed, self-expiring bursts of simple kinematic points. All
//! randomness comes from the engine's seeded RNG so two sessions with the
//! same seed produce identical particle streams.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Effect categories; the per-kind particle pattern is the contract the
/// rest of the game's look was tuned against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Sparks,
    CleaningBubbles,
    SuccessBurst,
    Error,
    Celebration,
}

/// Palette indices the renderer maps to actual colors
pub mod palette {
    pub const SPARK: u32 = 0;
    pub const BUBBLE: u32 = 1;
    pub const SUCCESS: u32 = 2;
    pub const ERROR: u32 = 3;
    /// Confetti occupies CONFETTI_BASE..CONFETTI_BASE + CONFETTI_COUNT
    pub const CONFETTI_BASE: u32 = 4;
    pub const CONFETTI_COUNT: u32 = 6;
}

/// A single kinematic point
#[derive(Debug, Clone, Serialize)]
pub struct Particle {
    pub pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    /// Milliseconds remaining; particle dies at zero
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    /// Palette index for renderer color lookup
    pub color: u32,
}

impl Particle {
    /// Render opacity, fading linearly with remaining life
    pub fn alpha(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

/// A timed burst of particles anchored at a spawn origin
#[derive(Debug, Clone, Serialize)]
pub struct VisualEffect {
    pub id: u32,
    pub kind: EffectKind,
    pub origin: Vec2,
    pub intensity: f32,
    /// Effect is dropped at this age even if particles remain
    pub duration_ms: f32,
    pub age_ms: f32,
    pub particles: Vec<Particle>,
}

// Per-kind pattern constants (counts and ranges are the visual contract)
const SPARK_COUNT: usize = 6;
const SPARK_SPEED: std::ops::Range<f32> = 30.0..70.0;
const SPARK_LIFE_MS: std::ops::Range<f32> = 500.0..800.0;

const BUBBLE_COUNT: usize = 12;
const BUBBLE_DISTANCE: std::ops::Range<f32> = 20.0..35.0;
const BUBBLE_LIFE_MS: std::ops::Range<f32> = 2000.0..3000.0;
const BUBBLE_RISE_SPEED: std::ops::Range<f32> = 18.0..36.0;
const BUBBLE_DRIFT_SPEED: f32 = 8.0;

const SUCCESS_COUNT: usize = 16;
const SUCCESS_SPEED: std::ops::Range<f32> = 50.0..80.0;
const SUCCESS_LIFE_MS: std::ops::Range<f32> = 1500.0..2000.0;

const ERROR_COUNT: usize = 8;
const ERROR_SPEED: std::ops::Range<f32> = 25.0..45.0;
const ERROR_LIFE_MS: std::ops::Range<f32> = 800.0..1200.0;

const CELEBRATION_BURSTS: usize = 5;
const CELEBRATION_COUNT: usize = 20;
const CELEBRATION_SPEED: std::ops::Range<f32> = 40.0..90.0;
const CELEBRATION_LIFE_MS: std::ops::Range<f32> = 2000.0..3000.0;
/// Slight upward bias added to every confetti particle (screen y grows down)
const CELEBRATION_LIFT: f32 = -25.0;

/// Spawns, advances, and expires visual effects
///
/// Effect ids come from a monotonic allocator; particle storage is capped
/// globally, evicting the oldest effect's particles first.
#[derive(Debug)]
pub struct EffectsEngine {
    effects: Vec<VisualEffect>,
    next_id: u32,
    rng: Pcg32,
    max_particles: usize,
}

impl EffectsEngine {
    pub fn new(rng: Pcg32, max_particles: usize) -> Self {
        Self {
            effects: Vec::new(),
            next_id: 1,
            rng,
            max_particles,
        }
    }

    fn next_effect_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn effects(&self) -> &[VisualEffect] {
        &self.effects
    }

    pub fn live_particles(&self) -> usize {
        self.effects.iter().map(|e| e.particles.len()).sum()
    }

    /// Bernoulli roll on the engine's seeded RNG (spark cadence and friends),
    /// so effect timing stays reproducible per session seed
    pub fn chance(&mut self, probability: f32) -> bool {
        self.rng.random_bool(probability.clamp(0.0, 1.0) as f64)
    }

    /// Spawn an anchored effect. Returns `None` when particle effects are
    /// disabled (cap of zero) - nothing is created and nothing will expire.
    pub fn spawn(&mut self, kind: EffectKind, origin: Vec2, intensity: f32) -> Option<u32> {
        if self.max_particles == 0 {
            return None;
        }
        let particles = match kind {
            EffectKind::Sparks => self.sparks_pattern(origin),
            EffectKind::CleaningBubbles => self.bubbles_pattern(origin),
            EffectKind::SuccessBurst => self.success_pattern(origin),
            EffectKind::Error => self.error_pattern(origin),
            EffectKind::Celebration => self.confetti_pattern(origin),
        };
        Some(self.push_effect(kind, origin, intensity, particles))
    }

    /// Session-completion celebration: five independent confetti bursts at
    /// randomized screen positions. Returns the ids actually spawned.
    pub fn spawn_celebration(&mut self, intensity: f32) -> Vec<u32> {
        if self.max_particles == 0 {
            return Vec::new();
        }
        (0..CELEBRATION_BURSTS)
            .map(|_| {
                let origin = Vec2::new(
                    self.rng.random_range(0.1..0.9) * SCREEN_WIDTH,
                    self.rng.random_range(0.15..0.7) * SCREEN_HEIGHT,
                );
                let particles = self.confetti_pattern(origin);
                self.push_effect(EffectKind::Celebration, origin, intensity, particles)
            })
            .collect()
    }

    fn push_effect(
        &mut self,
        kind: EffectKind,
        origin: Vec2,
        intensity: f32,
        mut particles: Vec<Particle>,
    ) -> u32 {
        particles.truncate(self.max_particles);
        self.make_room(particles.len());
        let duration_ms = particles
            .iter()
            .map(|p| p.max_life)
            .fold(0.0_f32, f32::max);
        let id = self.next_effect_id();
        self.effects.push(VisualEffect {
            id,
            kind,
            origin,
            intensity,
            duration_ms,
            age_ms: 0.0,
            particles,
        });
        id
    }

    /// Evict oldest effects until `incoming` more particles fit under the cap
    fn make_room(&mut self, incoming: usize) {
        let budget = self.max_particles.saturating_sub(incoming);
        while self.live_particles() > budget && !self.effects.is_empty() {
            self.effects.remove(0);
        }
    }

    /// 6 particles, random radial direction, speed 30-70, life 500-800 ms
    fn sparks_pattern(&mut self, origin: Vec2) -> Vec<Particle> {
        (0..SPARK_COUNT)
            .map(|_| {
                let angle = self.rng.random_range(0.0..TAU);
                let speed = self.rng.random_range(SPARK_SPEED);
                let life = self.rng.random_range(SPARK_LIFE_MS);
                Particle {
                    pos: origin,
                    vel: Vec2::from_angle(angle) * speed,
                    life,
                    max_life: life,
                    size: self.rng.random_range(2.0..4.0),
                    color: palette::SPARK,
                }
            })
            .collect()
    }

    /// 12 particles evenly spaced at 30 degree steps, distance 20-35 from the
    /// origin, upward-biased velocity, life 2000-3000 ms
    fn bubbles_pattern(&mut self, origin: Vec2) -> Vec<Particle> {
        (0..BUBBLE_COUNT)
            .map(|i| {
                let angle = TAU * (i as f32 / BUBBLE_COUNT as f32);
                let distance = self.rng.random_range(BUBBLE_DISTANCE);
                let life = self.rng.random_range(BUBBLE_LIFE_MS);
                let drift = self.rng.random_range(-BUBBLE_DRIFT_SPEED..BUBBLE_DRIFT_SPEED);
                Particle {
                    pos: origin + Vec2::from_angle(angle) * distance,
                    vel: Vec2::new(drift, -self.rng.random_range(BUBBLE_RISE_SPEED)),
                    life,
                    max_life: life,
                    size: self.rng.random_range(3.0..7.0),
                    color: palette::BUBBLE,
                }
            })
            .collect()
    }

    /// 16 particles evenly spaced at 22.5 degree steps, speed 50-80,
    /// life 1500-2000 ms
    fn success_pattern(&mut self, origin: Vec2) -> Vec<Particle> {
        (0..SUCCESS_COUNT)
            .map(|i| {
                let angle = TAU * (i as f32 / SUCCESS_COUNT as f32);
                let speed = self.rng.random_range(SUCCESS_SPEED);
                let life = self.rng.random_range(SUCCESS_LIFE_MS);
                Particle {
                    pos: origin,
                    vel: Vec2::from_angle(angle) * speed,
                    life,
                    max_life: life,
                    size: self.rng.random_range(3.0..6.0),
                    color: palette::SUCCESS,
                }
            })
            .collect()
    }

    /// 8 particles evenly spaced at 45 degree steps, speed 25-45,
    /// life 800-1200 ms
    fn error_pattern(&mut self, origin: Vec2) -> Vec<Particle> {
        (0..ERROR_COUNT)
            .map(|i| {
                let angle = TAU * (i as f32 / ERROR_COUNT as f32);
                let speed = self.rng.random_range(ERROR_SPEED);
                let life = self.rng.random_range(ERROR_LIFE_MS);
                Particle {
                    pos: origin,
                    vel: Vec2::from_angle(angle) * speed,
                    life,
                    max_life: life,
                    size: self.rng.random_range(2.0..5.0),
                    color: palette::ERROR,
                }
            })
            .collect()
    }

    /// 20 confetti particles, random palette color, slight upward bias,
    /// life 2000-3000 ms
    fn confetti_pattern(&mut self, origin: Vec2) -> Vec<Particle> {
        (0..CELEBRATION_COUNT)
            .map(|_| {
                let angle = self.rng.random_range(0.0..TAU);
                let speed = self.rng.random_range(CELEBRATION_SPEED);
                let life = self.rng.random_range(CELEBRATION_LIFE_MS);
                let color =
                    palette::CONFETTI_BASE + self.rng.random_range(0..palette::CONFETTI_COUNT);
                Particle {
                    pos: origin,
                    vel: Vec2::from_angle(angle) * speed + Vec2::new(0.0, CELEBRATION_LIFT),
                    life,
                    max_life: life,
                    size: self.rng.random_range(3.0..7.0),
                    color,
                }
            })
            .collect()
    }

    /// Age every particle, integrate positions, drop dead particles, and
    /// drop effects whose duration elapsed or whose particle list emptied.
    /// Returns the ids of effects removed this tick.
    pub fn update(&mut self, dt_ms: f32) -> Vec<u32> {
        let dt_secs = dt_ms / 1000.0;
        for effect in &mut self.effects {
            effect.age_ms += dt_ms;
            for particle in &mut effect.particles {
                particle.life -= dt_ms;
                particle.pos += particle.vel * dt_secs;
            }
            effect.particles.retain(|p| p.life > 0.0);
        }

        let mut expired = Vec::new();
        self.effects.retain(|e| {
            let done = e.age_ms >= e.duration_ms || e.particles.is_empty();
            if done {
                expired.push(e.id);
            }
            !done
        });
        expired
    }

    /// Synchronous teardown; nothing can fire afterwards
    pub fn clear(&mut self) {
        self.effects.clear();
    }
}
