use glam::{Vec2, Vec3};

use crate::config::FieldConfig;
use crate::field::ParticleField;
use crate::render::Instance;

/// Shared rotation state of one animator instance, advanced once per frame.
///
/// Angles accumulate without wrapping; trig periodicity takes care of it.
#[derive(Clone, Copy, Default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
}

impl Rotation {
    pub fn advance(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// A particle's projected screen-space target and its perspective scale.
#[derive(Clone, Copy, Debug)]
pub struct Projected {
    pub target: Vec2,
    pub scale: f32,
}

/// Rotates a model-space point (yaw about the vertical axis, then pitch
/// about the horizontal axis) and projects it onto the surface.
pub fn project(home: Vec3, rotation: Rotation, config: &FieldConfig, center: Vec2) -> Projected {
    let (sin_y, cos_y) = rotation.y.sin_cos();
    let (sin_x, cos_x) = rotation.x.sin_cos();

    let rx = home.x * cos_y - home.z * sin_y;
    let mut rz = home.x * sin_y + home.z * cos_y;
    let ry = home.y * cos_x - rz * sin_x;
    rz = home.y * sin_x + rz * cos_x;

    let scale = config.perspective / (config.perspective + rz + config.depth_offset);
    Projected {
        target: center + Vec2::new(rx, ry) * scale,
        scale,
    }
}

/// One spring-damp step toward `target`.
pub fn integrate(position: &mut Vec2, velocity: &mut Vec2, target: Vec2, config: &FieldConfig) {
    *velocity += (target - *position) * config.stiffness;
    *velocity *= config.damping;
    *position += *velocity;
}

/// Depth-cued draw radius and alpha, floored at the configured minimums
/// for any scale, negative and near-zero included.
pub fn draw_params(base_radius: f32, scale: f32, config: &FieldConfig) -> (f32, f32) {
    let radius = (base_radius * scale).max(config.min_radius);
    let alpha = scale.clamp(config.min_alpha, 1.0);
    (radius, alpha)
}

/// Advances one frame: rotation, then per-particle projection, spring
/// integration and draw parameters. Appends one render instance per
/// particle into `instances` (cleared first).
pub fn step(
    field: &mut ParticleField,
    rotation: &mut Rotation,
    config: &FieldConfig,
    width: u32,
    height: u32,
    instances: &mut Vec<Instance>,
) {
    rotation.advance(config.rotation_delta);

    let center = Vec2::new(width as f32, height as f32) / 2.0;

    instances.clear();
    instances.reserve(field.particles.len());
    for particle in &mut field.particles {
        let projected = project(particle.home, *rotation, config, center);
        integrate(
            &mut particle.position,
            &mut particle.velocity,
            projected.target,
            config,
        );

        let (radius, alpha) = draw_params(particle.radius, projected.scale, config);
        instances.push(Instance {
            position: particle.position.to_array(),
            radius,
            alpha,
            color: [particle.color[0], particle.color[1], particle.color[2], 1.0],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::field::ParticleField;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn rotation_accumulates_exactly() {
        let config = FieldConfig::hero();
        let mut rotation = Rotation::default();
        for _ in 0..240 {
            rotation.advance(config.rotation_delta);
        }

        assert!((rotation.x - 240.0 * config.rotation_delta.x).abs() < 1e-4);
        assert!((rotation.y - 240.0 * config.rotation_delta.y).abs() < 1e-4);
    }

    #[test]
    fn origin_projects_to_center() {
        let config = FieldConfig::widget();
        let center = Vec2::new(48.0, 48.0);
        let p = project(Vec3::ZERO, Rotation { x: 0.7, y: 1.3 }, &config, center);

        assert!((p.target - center).length() < 1e-4);
        let expected = config.perspective / (config.perspective + config.depth_offset);
        assert!((p.scale - expected).abs() < 1e-6);
    }

    #[test]
    fn yaw_is_applied_before_pitch() {
        let config = FieldConfig::hero();
        let quarter = std::f32::consts::FRAC_PI_2;

        // Yaw by 90deg moves +x onto +z; the subsequent pitch must then
        // rotate that z, not the original x.
        let p = project(
            Vec3::new(100.0, 0.0, 0.0),
            Rotation { x: quarter, y: quarter },
            &config,
            Vec2::ZERO,
        );
        assert!(p.target.x.abs() < 1e-2);
        // rz = 100 rotated into -y by the pitch
        assert!(p.target.y < -50.0);
    }

    #[test]
    fn spring_converges_to_a_fixed_target() {
        let config = FieldConfig::hero();
        let target = Vec2::new(300.0, 200.0);
        let mut position = Vec2::new(0.0, 700.0);
        let mut velocity = Vec2::new(1.0, -1.0);

        let start = (target - position).length();
        for _ in 0..400 {
            integrate(&mut position, &mut velocity, target, &config);
        }

        let end = (target - position).length();
        assert!(end < start / 100.0, "no convergence: {start} -> {end}");
        assert!(end < 1.0);
    }

    #[test]
    fn draw_params_respect_floors() {
        let config = FieldConfig::hero();
        for scale in [-2.0f32, -0.01, 0.0, 0.001] {
            let (radius, alpha) = draw_params(2.0, scale, &config);
            assert!(radius >= config.min_radius);
            assert!(alpha >= config.min_alpha);
        }

        // Large scales still cap alpha at 1.
        let (_, alpha) = draw_params(2.0, 5.0, &config);
        assert!(alpha <= 1.0);
    }

    #[test]
    fn step_emits_one_instance_per_particle() {
        let config = FieldConfig::widget();
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = ParticleField::generate(&config, 96, 96, &mut rng);
        let mut rotation = Rotation::default();
        let mut instances = Vec::new();

        step(&mut field, &mut rotation, &config, 96, 96, &mut instances);
        assert_eq!(instances.len(), field.len());

        for instance in &instances {
            assert!(instance.radius >= config.min_radius);
            assert!(instance.alpha >= config.min_alpha && instance.alpha <= 1.0);
        }
    }

    #[test]
    fn particles_assemble_into_formation() {
        let config = FieldConfig::widget();
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = ParticleField::generate(&config, 96, 96, &mut rng);
        let mut rotation = Rotation::default();
        let mut instances = Vec::new();

        let error = |field: &ParticleField, rotation: Rotation| -> f32 {
            let center = Vec2::new(48.0, 48.0);
            field
                .particles
                .iter()
                .map(|p| {
                    let projected = project(p.home, rotation, &config, center);
                    (projected.target - p.position).length()
                })
                .sum::<f32>()
                / field.len() as f32
        };

        let before = error(&field, rotation);
        for _ in 0..600 {
            step(&mut field, &mut rotation, &config, 96, 96, &mut instances);
        }
        let after = error(&field, rotation);

        // The cube keeps rotating, so particles trail their targets, but the
        // mean error collapses from scattered-start to formation scale.
        assert!(after < before / 4.0, "no assembly: {before} -> {after}");
    }
}
