//! Cosmetic splash particles.
//!
//! Splashes never touch grid occupancy; rules only spawn them.

use crate::random::RandomSource;

/// Light gravity applied to splash droplets, as a fraction of cell gravity.
const SPLASH_GRAVITY_SCALE: f32 = 0.2;
const SPLASH_DAMPING: f32 = 0.95;
const MAX_ALPHA: f32 = 200.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Splash {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub age: u32,
    pub max_age: u32,
    pub size: f32,
}

impl Splash {
    fn step(&mut self, gravity: f32) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += gravity * SPLASH_GRAVITY_SCALE;
        self.age += 1;
        self.vx *= SPLASH_DAMPING;
        self.vy *= SPLASH_DAMPING;
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.age >= self.max_age
    }

    /// Fades linearly from 200 to 0 over the particle's life.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        if self.max_age == 0 {
            return 0.0;
        }
        (MAX_ALPHA * (1.0 - self.age as f32 / self.max_age as f32)).max(0.0)
    }
}

#[derive(Debug)]
pub struct SplashRelay {
    particles: Vec<Splash>,
    capacity: usize,
}

impl SplashRelay {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::new(),
            capacity,
        }
    }

    /// Burst of 1..=3 droplets from the centre of cell `(x, y)`.
    ///
    /// `vy` is the speed of whatever caused the splash; faster impacts throw
    /// droplets higher. Spawns past capacity are dropped.
    pub fn spawn(&mut self, x: i32, y: i32, vy: f32, rng: &mut dyn RandomSource) {
        let count = rng.range(1.0, 4.0).floor() as usize;
        for _ in 0..count {
            let angle = rng.angle();
            let speed = rng.range(0.5, 2.0);
            let max_age = rng.range(10.0, 30.0) as u32;
            let size = rng.range(1.0, 3.0);
            if self.particles.len() >= self.capacity {
                continue;
            }
            self.particles.push(Splash {
                x: x as f32 + 0.5,
                y: y as f32 + 0.5,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed - vy.abs() * 0.5,
                age: 0,
                max_age,
                size,
            });
        }
    }

    /// Advance every droplet one tick and drop the expired ones.
    pub fn step(&mut self, gravity: f32) {
        self.particles.retain_mut(|p| {
            p.step(gravity);
            !p.is_dead()
        });
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.particles.truncate(capacity);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    #[must_use]
    pub fn particles(&self) -> &[Splash] {
        &self.particles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
