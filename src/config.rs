use glam::Vec2;

use crate::cli::{Args, Preset};

/// Cyan / fuchsia, the two palette values particles are drawn with.
pub const PALETTE: [[f32; 3]; 2] = [
    [0.024, 0.714, 0.831], // #06b6d4
    [0.910, 0.475, 0.976], // #e879f9
];

/// Everything one animator instance is parameterized by.
///
/// The two presets only differ in scale; the math is shared.
#[derive(Clone, Debug)]
pub struct FieldConfig {
    /// Fixed surface size, or `None` to follow the window and
    /// regenerate the field on every resize.
    pub surface_size: Option<(u32, u32)>,

    /// Model-space half edge length of the cube.
    pub half_extent: f32,
    /// Model-space step between candidate lattice points.
    pub spacing: f32,

    /// Perspective projection distance.
    pub perspective: f32,
    /// Depth added to every rotated z, pushing the cube behind the camera plane.
    pub depth_offset: f32,

    /// Fraction of positional error applied to velocity per frame.
    pub stiffness: f32,
    /// Multiplicative velocity decay per frame.
    pub damping: f32,

    /// Opacity of the full-surface fade rectangle painted before each frame.
    pub fade_alpha: f32,
    /// Radians added to (pitch, yaw) per frame.
    pub rotation_delta: Vec2,

    /// Base particle radius range in pixels.
    pub radius_range: [f32; 2],
    /// Floor for the projected draw radius.
    pub min_radius: f32,
    /// Floor for the projected draw alpha.
    pub min_alpha: f32,

    /// Background color, also the fade color.
    pub background: [f32; 3],
}

impl FieldConfig {
    /// The small 96px cube badge.
    pub fn widget() -> Self {
        Self {
            surface_size: Some((96, 96)),
            half_extent: 60.0,
            spacing: 20.0,
            perspective: 400.0,
            depth_offset: 200.0,
            fade_alpha: 0.2,
            radius_range: [0.5, 2.0],
            min_radius: 0.3,
            ..Self::hero()
        }
    }

    /// The full-window hero background.
    pub fn hero() -> Self {
        Self {
            surface_size: None,
            half_extent: 180.0,
            spacing: 40.0,
            perspective: 800.0,
            depth_offset: 400.0,
            stiffness: 0.02,
            damping: 0.92,
            fade_alpha: 0.15,
            rotation_delta: Vec2::new(0.005, 0.008),
            radius_range: [1.0, 3.0],
            min_radius: 0.5,
            min_alpha: 0.1,
            background: [0.0, 0.0, 0.0],
        }
    }

    pub fn from_args(args: &Args) -> Self {
        let mut config = match args.preset {
            Preset::Widget => Self::widget(),
            Preset::Hero => Self::hero(),
        };

        if let Some(half_extent) = args.half_extent {
            config.half_extent = half_extent;
        }
        if let Some(spacing) = args.spacing {
            config.spacing = spacing;
        }
        if let Some(stiffness) = args.stiffness {
            config.stiffness = stiffness;
        }
        if let Some(damping) = args.damping {
            config.damping = damping;
        }
        if let Some(fade) = args.fade {
            config.fade_alpha = fade;
        }

        config
    }
}
