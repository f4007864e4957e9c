#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod args;
mod render;

use std::fs;

use args::Args;
use clap::Parser;
use log::{info, LevelFilter};
use util::{error::CrossgenResult, time::time_fn};
use xword_fill::{solver::Solver, structure::Structure};
use xword_words::word_list::WordList;

fn configure_logging(verbose: bool) {
  let level_filter = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
  env_logger::Builder::new()
    .filter_level(level_filter)
    .parse_default_env()
    .init();
}

fn main() -> CrossgenResult {
  let args = Args::parse();
  configure_logging(args.verbose);

  let words = WordList::parse(&fs::read_to_string(&args.words)?);
  info!("loaded {} candidate words", words.len());

  let structure = Structure::from_layout(&fs::read_to_string(&args.structure)?, words)?;
  info!(
    "{}x{} structure with {} variables",
    structure.width(),
    structure.height(),
    structure.num_variables()
  );

  let solver = Solver::new(structure);
  let (time, (solution, stats)) = time_fn(|| solver.solve_with_stats());
  info!(
    "search finished in {:.3}s after {} assignments and {} backtracks",
    time.as_secs_f32(),
    stats.states,
    stats.backtracks
  );

  let Some(assignment) = solution else {
    println!("No solution.");
    return Ok(());
  };

  let grid = solver.letter_grid(&assignment);
  print!("{}", render::format_grid(&grid));

  if let Some(output) = &args.output {
    render::write_output(output, &grid)?;
    info!("wrote {}", output.display());
  }

  Ok(())
}
