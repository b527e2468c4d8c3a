use glam::Vec2;

use crate::core::{particle::Particle, types::Viewport};

/// Which side of the viewport a particle was pushed back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

/// The viewport rectangle `[0, width] × [0, height]` as four walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walls {
    pub viewport: Viewport,
    /// Fraction of the outward velocity kept after a bounce.
    pub restitution: f32,
}

impl Walls {
    pub fn new(viewport: Viewport, restitution: f32) -> Self {
        Self {
            viewport,
            restitution,
        }
    }

    /// Clamps a particle back inside the viewport.
    ///
    /// On every axis where the particle sits on or past a wall, the position is
    /// clamped to the wall, an outward velocity is reflected and scaled by the
    /// restitution, and an outward pending force is zeroed. Returns the walls
    /// that were hit, in left/right/top/bottom order.
    pub fn resolve(&self, particle: &mut Particle) -> Vec<Wall> {
        let mut hits = Vec::new();
        let (width, height) = (self.viewport.width, self.viewport.height);

        if particle.p.x <= 0.0 {
            self.bounce(&mut particle.p.x, &mut particle.v.x, &mut particle.f.x, 0.0, -1.0);
            hits.push(Wall::Left);
        } else if particle.p.x >= width {
            self.bounce(&mut particle.p.x, &mut particle.v.x, &mut particle.f.x, width, 1.0);
            hits.push(Wall::Right);
        }

        if particle.p.y <= 0.0 {
            self.bounce(&mut particle.p.y, &mut particle.v.y, &mut particle.f.y, 0.0, -1.0);
            hits.push(Wall::Top);
        } else if particle.p.y >= height {
            self.bounce(&mut particle.p.y, &mut particle.v.y, &mut particle.f.y, height, 1.0);
            hits.push(Wall::Bottom);
        }

        hits
    }

    /// `outward` is the sign of the wall normal pointing out of the viewport.
    fn bounce(&self, p: &mut f32, v: &mut f32, f: &mut f32, wall: f32, outward: f32) {
        *p = wall;
        if *v * outward > 0.0 {
            *v = -*v * self.restitution;
        }
        if *f * outward > 0.0 {
            *f = 0.0;
        }
    }
}

/// Correction run after every step: pinned particles lose their velocity, then
/// every particle is pushed back inside the walls. Returns how many particles
/// touched a wall.
pub fn post_step_fix(particles: &mut [Particle], walls: &Walls) -> usize {
    let mut touching = 0;
    for particle in particles.iter_mut() {
        if particle.pinned {
            particle.v = Vec2::ZERO;
        }
        if !walls.resolve(particle).is_empty() {
            touching += 1;
        }
    }
    touching
}
