use glam::{Vec2, Vec3};
use rand::Rng;

use crate::config::{FieldConfig, PALETTE};

/// A lattice point counts as "on the shell" when at least one coordinate
/// lies within this distance of the cube's half extent.
pub const SHELL_TOLERANCE: f32 = 1.0;

/// One simulated point of the cube.
///
/// `home` is fixed for the particle's lifetime; `position` and `velocity`
/// are screen-space and mutated every frame.
pub struct Particle {
    pub home: Vec3,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: [f32; 3],
    pub radius: f32,
}

/// Model-space lattice points on the surface shell of the cube.
///
/// Enumerates `-half_extent ..= +half_extent` stepping by `spacing` on each
/// axis and keeps only points with at least one coordinate at the shell.
/// Deterministic in `(half_extent, spacing)`.
pub fn lattice_points(half_extent: f32, spacing: f32) -> Vec<Vec3> {
    let mut points = Vec::new();
    if spacing <= 0.0 || half_extent <= 0.0 {
        return points;
    }

    let on_shell = |c: f32| (c.abs() - half_extent).abs() < SHELL_TOLERANCE;

    // Integer step indices keep the sequence exact; accumulating floats
    // would drift off the endpoints for fractional spacings.
    let steps = (2.0 * half_extent / spacing).floor() as i32;
    let coord = |i: i32| -half_extent + i as f32 * spacing;

    for xi in 0..=steps {
        for yi in 0..=steps {
            for zi in 0..=steps {
                let p = Vec3::new(coord(xi), coord(yi), coord(zi));
                if on_shell(p.x) || on_shell(p.y) || on_shell(p.z) {
                    points.push(p);
                }
            }
        }
    }

    points
}

/// The full particle set of one animator instance.
pub struct ParticleField {
    pub particles: Vec<Particle>,
}

impl ParticleField {
    /// Builds the field from scratch for the given surface size.
    ///
    /// Lattice geometry is deterministic; initial screen position, velocity,
    /// color and radius come from `rng` so particles visibly converge into
    /// formation instead of appearing pre-assembled.
    pub fn generate(config: &FieldConfig, width: u32, height: u32, rng: &mut impl Rng) -> Self {
        let particles = lattice_points(config.half_extent, config.spacing)
            .into_iter()
            .map(|home| Particle {
                home,
                position: Vec2::new(
                    rng.gen_range(0.0..width.max(1) as f32),
                    rng.gen_range(0.0..height.max(1) as f32),
                ),
                velocity: Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0)),
                color: PALETTE[rng.gen_range(0..PALETTE.len())],
                radius: rng.gen_range(config.radius_range[0]..=config.radius_range[1]),
            })
            .collect();

        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn in_sequence(c: f32, half_extent: f32, spacing: f32) -> bool {
        let i = (c + half_extent) / spacing;
        (i - i.round()).abs() < 1e-3 && c.abs() <= half_extent + 1e-3
    }

    #[test]
    fn widget_lattice_golden_count() {
        // 7 values per axis, 5^3 interior points filtered out.
        let points = lattice_points(60.0, 20.0);
        assert_eq!(points.len(), 343 - 125);
    }

    #[test]
    fn hero_lattice_golden_count() {
        // 10 values per axis (no zero crossing), 8^3 interior.
        let points = lattice_points(180.0, 40.0);
        assert_eq!(points.len(), 1000 - 512);
    }

    #[test]
    fn lattice_points_lie_on_shell() {
        for &(half_extent, spacing) in &[(60.0f32, 20.0f32), (180.0, 40.0), (2.5, 1.0)] {
            let points = lattice_points(half_extent, spacing);
            assert!(!points.is_empty());

            for p in &points {
                for c in [p.x, p.y, p.z] {
                    assert!(
                        in_sequence(c, half_extent, spacing),
                        "{c} not in lattice sequence for ({half_extent}, {spacing})"
                    );
                }
                assert!(
                    [p.x, p.y, p.z]
                        .iter()
                        .any(|c| (c.abs() - half_extent).abs() < SHELL_TOLERANCE),
                    "{p:?} is an interior point"
                );
            }
        }
    }

    #[test]
    fn lattice_is_deterministic() {
        let a = lattice_points(60.0, 20.0);
        let b = lattice_points(60.0, 20.0);
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_configs_yield_no_points() {
        assert!(lattice_points(60.0, 0.0).is_empty());
        assert!(lattice_points(0.0, 20.0).is_empty());
    }

    #[test]
    fn generated_particles_start_inside_surface() {
        let config = crate::config::FieldConfig::widget();
        let mut rng = StdRng::seed_from_u64(7);
        let field = ParticleField::generate(&config, 96, 96, &mut rng);

        assert_eq!(field.len(), 218);
        for p in &field.particles {
            assert!(p.position.x >= 0.0 && p.position.x < 96.0);
            assert!(p.position.y >= 0.0 && p.position.y < 96.0);
            assert!(p.velocity.x.abs() <= 1.0 && p.velocity.y.abs() <= 1.0);
            assert!(p.radius >= config.radius_range[0] && p.radius <= config.radius_range[1]);
            assert!(PALETTE.contains(&p.color));
        }
    }

    #[test]
    fn regeneration_keeps_the_lattice() {
        let config = crate::config::FieldConfig::hero();
        let mut rng = StdRng::seed_from_u64(1);
        let a = ParticleField::generate(&config, 1280, 720, &mut rng);
        let b = ParticleField::generate(&config, 1920, 1080, &mut rng);

        let homes = |f: &ParticleField| f.particles.iter().map(|p| p.home).collect::<Vec<_>>();
        assert_eq!(homes(&a), homes(&b));
    }
}
