use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One simulated body.
///
/// Particles live in a flat array and keep their index for the whole run,
/// so hosts may key visuals by position in [`crate::Simulation::particles`].
/// The layout is `#[repr(C)]` with no padding, which lets the readout be
/// handed to a GPU buffer as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub type_index: u32,
    pub mass: f32,
    pub radius: f32,
}

impl Particle {
    pub fn new(position: Vec3, velocity: Vec3, type_index: u32, mass: f32, radius: f32) -> Self {
        Self {
            position,
            velocity,
            type_index,
            mass,
            radius,
        }
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass as f64 * self.velocity.length_squared() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_has_no_padding() {
        assert_eq!(std::mem::size_of::<Particle>(), 36);
        assert_eq!(std::mem::align_of::<Particle>(), 4);

        let particles = [Particle::new(Vec3::X, Vec3::Y, 2, 1.5, 0.25)];
        let bytes: &[u8] = bytemuck::cast_slice(&particles);
        assert_eq!(bytes.len(), 36);
        let back: &[Particle] = bytemuck::cast_slice(bytes);
        assert_eq!(back[0].type_index, 2);
    }

    #[test]
    fn kinetic_energy_uses_mass_and_speed() {
        let p = Particle::new(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0), 0, 2.0, 1.0);
        assert_eq!(p.kinetic_energy(), 25.0);
    }
}
