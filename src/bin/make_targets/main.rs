/// Render training targets for a simulated stack of frames
mod cli;

use std::error::Error;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array4, Axis};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use smlm::{
    config::read_config_file,
    io::write_targets,
    utils::{group_digits, timing::Progress},
    Extent, LooseEmitterSet, XyUnit,
};
use units::um_;

use cli::Cli;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    let mut progress = Progress::new();

    // --- Target generator ----------------------------------------------------------
    progress.start(&format!("Reading config {}", args.config.display()));
    let config = read_config_file(&args.config)?;
    let grid = config.grid()?;
    let generator = config.target_generator()?;
    progress.done();
    if let Some([sx, sy]) = config.px_size {
        log::info!("Field of view: {:.2} x {:.2} um",
                   um_(sx * grid.xextent.width()),
                   um_(sy * grid.yextent.width()));
    }

    rayon::ThreadPoolBuilder::new().num_threads(args.threads).build_global()?;

    // --- Simulate emitters -----------------------------------------------------------
    progress.start("Simulating emitters");
    let mut rng = StdRng::seed_from_u64(args.seed);
    let zextent = grid.zextent.map_or_else(|| Extent::new(-1.0, 1.0), Ok)?;
    let time = Extent::new(0.0, args.frames as f32)?;
    let extents = [grid.xextent, grid.yextent, zextent];
    let mut loose = LooseEmitterSet::random(args.emitters, extents, time, args.lifetime, args.intensity, &mut rng)?
        .with_unit(XyUnit::Px);
    if let Some(px_size) = config.px_size { loose = loose.with_px_size(px_size) }
    let em = loose.return_emitterset();
    let frames = em.split_in_frames(Some(0), Some(args.frames as i64 - 1))?;
    progress.done_with_message(&format!("{} localizations over {} frames", group_digits(em.len()), frames.len()));

    // --- Render targets --------------------------------------------------------------
    let bar = ProgressBar::new(frames.len() as u64);
    bar.set_style(ProgressStyle::default_bar()
                  .template("Rendering targets\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")?);
    let targets: Vec<_> = frames.par_iter()
        .map(|frame| {
            let target = generator.forward(frame);
            bar.inc(1);
            target
        })
        .collect();
    bar.finish();

    // --- Write output ----------------------------------------------------------------
    progress.start(&format!("Writing {}", args.out.display()));
    let [nx, ny] = generator.img_shape();
    let mut stack = Array4::zeros((targets.len(), generator.channels(), nx, ny));
    for (mut slot, target) in stack.axis_iter_mut(Axis(0)).zip(&targets) {
        slot.assign(target);
    }
    write_targets(&stack, &args.out)?;
    progress.done();
    Ok(())
}
