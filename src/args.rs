use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
  /// Structure layout file: `_` marks a fillable cell, any other
  /// non-whitespace character a blocked one.
  pub structure: PathBuf,

  /// Newline-delimited candidate word list.
  pub words: PathBuf,

  /// Optional output file; a `.svg` extension gets a vector image, anything
  /// else the text rendering.
  pub output: Option<PathBuf>,

  /// Log propagation and search details.
  #[arg(long, short)]
  pub verbose: bool,
}
