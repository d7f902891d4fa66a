use std::path::PathBuf;

/// Command line interface for `make_targets` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "make_targets",
    about = "Simulate blinking emitters and render their per-frame training targets",
)]
pub (super) struct Cli {
    /// TOML file describing the target grid and generator
    #[clap(short, long)]
    pub config: PathBuf,

    /// Output file for the (frame, channel, x, y) target stack
    #[clap(short, long, default_value = "targets.bin")]
    pub out: PathBuf,

    /// Number of frames to simulate
    #[clap(short, long, default_value = "100")]
    pub frames: usize,

    /// Number of emitters switching on during the simulated frames
    #[clap(short = 'n', long, default_value = "1000")]
    pub emitters: usize,

    /// Mean on-time of an emitter, in frames
    #[clap(long, default_value = "2.0")]
    pub lifetime: f32,

    /// Photons emitted per frame while an emitter is on
    #[clap(long, default_value = "5000.0")]
    pub intensity: f32,

    /// Seed for the random number generator
    #[clap(short, long, default_value = "0")]
    pub seed: u64,

    /// Maximum number of rayon threads used to render targets
    #[clap(short = 'j', long, default_value = "4")]
    pub threads: usize,
}
