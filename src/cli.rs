use clap::{Parser, ValueEnum};

/// A rotating hollow-cube particle field
#[derive(Parser)]
#[command()]
pub struct Args {
    /// Field preset to run
    #[arg(value_enum, default_value_t = Preset::Hero)]
    pub preset: Preset,

    /// The framerate the animation will run at
    ///
    /// if default the animation runs as fast as the surface presents
    #[arg(short, long)]
    pub framerate: Option<u32>,

    /// Seed for particle placement, colors and sizes
    ///
    /// if default a new seed is drawn from the system every run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Cube half edge length in model units
    #[arg(long)]
    pub half_extent: Option<f32>,

    /// Model-space step between lattice points
    #[arg(long)]
    pub spacing: Option<f32>,

    /// Fraction of positional error applied to velocity per frame
    #[arg(long)]
    pub stiffness: Option<f32>,

    /// Multiplicative velocity decay per frame
    #[arg(long)]
    pub damping: Option<f32>,

    /// Opacity of the per-frame fade rectangle (trail strength)
    #[arg(long)]
    pub fade: Option<f32>,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Preset {
    /// Small fixed-size surface, tight cube
    Widget,
    /// Window-sized surface, regenerated on resize
    Hero,
}
