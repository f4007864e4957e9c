use std::{fmt::Write, fs, path::Path};

use util::{
  error::CrossgenResult,
  grid::{Grid, Gridlike},
};
use xword_fill::solver::Tile;

const CELL_SIZE: u32 = 100;
const CELL_BORDER: u32 = 2;
const FONT_SIZE: u32 = 72;

/// One row of characters per grid row, blocked cells kept distinct from
/// unfilled ones.
pub fn format_grid(grid: &Grid<Tile>) -> String {
  let mut out = String::new();
  for y in 0..grid.height() {
    out.extend(grid.iter_row(y).map(|&tile| tile.to_char()));
    out.push('\n');
  }
  out
}

/// Writes the grid to `path`, as an SVG image when the extension is `svg`
/// and as text otherwise.
pub fn write_output(path: &Path, grid: &Grid<Tile>) -> CrossgenResult {
  let rendered = if path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
  {
    svg_string(grid)?
  } else {
    format_grid(grid)
  };
  fs::write(path, rendered)?;
  Ok(())
}

fn svg_string(grid: &Grid<Tile>) -> CrossgenResult<String> {
  let width = grid.width() * CELL_SIZE;
  let height = grid.height() * CELL_SIZE;
  let mut svg = String::new();
  writeln!(
    svg,
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
  )?;
  writeln!(svg, r#"<rect width="{width}" height="{height}" fill="black"/>"#)?;

  for pos in grid.positions() {
    let Some(&tile) = grid.get(pos) else { continue };
    if tile == Tile::Blocked {
      continue;
    }

    let x = pos.x as u32 * CELL_SIZE + CELL_BORDER;
    let y = pos.y as u32 * CELL_SIZE + CELL_BORDER;
    let side = CELL_SIZE - 2 * CELL_BORDER;
    writeln!(svg, r#"<rect x="{x}" y="{y}" width="{side}" height="{side}" fill="white"/>"#)?;

    if let Tile::Letter(letter) = tile {
      let center_x = pos.x as u32 * CELL_SIZE + CELL_SIZE / 2;
      let center_y = pos.y as u32 * CELL_SIZE + CELL_SIZE / 2;
      writeln!(
        svg,
        r#"<text x="{center_x}" y="{center_y}" font-size="{FONT_SIZE}" text-anchor="middle" dominant-baseline="central" fill="black">{letter}</text>"#
      )?;
    }
  }

  writeln!(svg, "</svg>")?;
  Ok(svg)
}
