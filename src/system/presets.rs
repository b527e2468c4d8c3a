use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::{particle::Particle, types::ParticleId},
    error::{SimulationError, SimulationResult},
    system::network::SpringNetwork,
};

/// Canned topologies that can be appended to a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    /// Braced two-column strip of 20 particles hanging off two pinned roots.
    Ladder,
    /// One free particle on a spring below a pinned anchor.
    Pendulum,
    /// Pinned anchor with ten particles below it, each tied to the previous
    /// two.
    HangingChain,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Ladder, Preset::Pendulum, Preset::HangingChain];

    /// Maps the numeric ids 1, 2 and 3 to presets.
    pub fn from_id(id: u8) -> SimulationResult<Self> {
        match id {
            1 => Ok(Preset::Ladder),
            2 => Ok(Preset::Pendulum),
            3 => Ok(Preset::HangingChain),
            other => Err(SimulationError::UnknownPreset(other)),
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Preset::Ladder => 1,
            Preset::Pendulum => 2,
            Preset::HangingChain => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Ladder => "ladder",
            Preset::Pendulum => "pendulum",
            Preset::HangingChain => "hanging chain",
        }
    }

    /// Appends the preset's particles and springs to `network`.
    pub(crate) fn build(&self, network: &mut SpringNetwork) -> SimulationResult<()> {
        match self {
            Preset::Ladder => build_ladder(network),
            Preset::Pendulum => {
                let anchor = add_at(network, 320.0, 100.0);
                let bob = add_at(network, 320.0, 200.0);
                network.particle_mut(anchor)?.pinned = true;
                network.add_spring(anchor, bob)?;
                Ok(())
            }
            Preset::HangingChain => {
                let mut previous = add_at(network, 320.0, 100.0);
                network.particle_mut(previous)?.pinned = true;
                let mut before_previous: Option<ParticleId> = None;
                let mut y = 100.0;
                for _ in 0..10 {
                    y += 20.0;
                    let next = add_at(network, 320.0, y);
                    network.add_spring(next, previous)?;
                    if let Some(second) = before_previous {
                        network.add_spring(next, second)?;
                    }
                    before_previous = Some(previous);
                    previous = next;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn add_at(network: &mut SpringNetwork, x: f32, y: f32) -> ParticleId {
    network.add_particle(Particle::new(Vec2::new(x, y), Vec2::ZERO))
}

fn build_ladder(network: &mut SpringNetwork) -> SimulationResult<()> {
    let mut lower = add_at(network, 100.0, 120.0);
    let mut upper = add_at(network, 100.0, 80.0);
    network.add_spring(lower, upper)?;
    network.particle_mut(lower)?.pinned = true;
    network.particle_mut(upper)?.pinned = true;

    let mut x = 140.0;
    for _ in 1..10 {
        let next_lower = add_at(network, x, 120.0);
        let next_upper = add_at(network, x, 80.0);
        network.add_spring(next_lower, lower)?;
        network.add_spring(next_lower, upper)?;
        network.add_spring(next_upper, lower)?;
        network.add_spring(next_upper, upper)?;
        network.add_spring(next_upper, next_lower)?;
        lower = next_lower;
        upper = next_upper;
        x += 40.0;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(preset: Preset) -> SpringNetwork {
        let mut network = SpringNetwork::new();
        preset.build(&mut network).expect("preset builds");
        network
    }

    #[test]
    fn ids_round_trip_and_reject_unknown() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_id(preset.id()), Ok(preset));
        }
        assert_eq!(Preset::from_id(0), Err(SimulationError::UnknownPreset(0)));
        assert_eq!(Preset::from_id(4), Err(SimulationError::UnknownPreset(4)));
    }

    #[test]
    fn ladder_topology() {
        let network = built(Preset::Ladder);
        assert_eq!(network.particles().len(), 20);
        assert_eq!(network.springs().len(), 46);
        let pinned: Vec<usize> = network
            .particles()
            .iter()
            .filter(|p| p.pinned)
            .map(|p| p.index)
            .collect();
        assert_eq!(pinned, vec![0, 1]);
        assert_eq!(network.particles()[19].p, Vec2::new(460.0, 80.0));
    }

    #[test]
    fn pendulum_and_chain_topology() {
        let pendulum = built(Preset::Pendulum);
        assert_eq!(pendulum.particles().len(), 2);
        assert_eq!(pendulum.springs().len(), 1);
        assert!(pendulum.particles()[0].pinned);

        let chain = built(Preset::HangingChain);
        assert_eq!(chain.particles().len(), 11);
        assert_eq!(chain.springs().len(), 19);
        assert_eq!(chain.particles()[10].p, Vec2::new(320.0, 300.0));
    }
}
