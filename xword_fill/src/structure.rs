use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use util::{
  error::{CrossgenError, CrossgenResult},
  grid::{Grid, Gridlike},
  pos::{Diff, Pos},
};
use xword_words::word_list::WordList;

/// Index of a variable in `Structure::variables`.
pub type VariableId = usize;

const MIN_VARIABLE_LENGTH: u32 = 2;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Direction {
  Across,
  Down,
}

impl Direction {
  pub const fn diff(self) -> Diff {
    match self {
      Direction::Across => Diff { x: 1, y: 0 },
      Direction::Down => Diff { x: 0, y: 1 },
    }
  }
}

/// A maximal run of fillable cells, at least two cells long. The word
/// assigned to it must have exactly `length` letters.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Variable {
  pub pos: Pos,
  pub direction: Direction,
  pub length: u32,
}

impl Variable {
  /// The cells this variable occupies, in letter order.
  pub fn cells(&self) -> impl Iterator<Item = Pos> {
    let pos = self.pos;
    let diff = self.direction.diff();
    (0..self.length as i32).map(move |index| pos + diff * index)
  }
}

/// Crossing cell of an ordered pair of variables (x, y): letter `index` of x
/// and letter `other_index` of y occupy the same cell, so the words assigned
/// to x and y must agree there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlap {
  pub index: u32,
  pub other_index: u32,
}

impl Overlap {
  pub const fn swap(self) -> Self {
    Self { index: self.other_index, other_index: self.index }
  }
}

/// The puzzle geometry: fillable cells, the variables they form, and which
/// variables cross which. Everything is computed once at load and read-only
/// afterwards.
#[derive(Clone, Debug)]
pub struct Structure {
  grid: Grid<bool>,
  words: WordList,
  variables: Vec<Variable>,
  overlaps: Vec<Vec<Option<Overlap>>>,
  neighbors: Vec<Vec<VariableId>>,
}

impl Structure {
  /// Parses a layout with one row per line, `_` marking a fillable cell and
  /// any other non-whitespace character a blocked one.
  pub fn from_layout(layout: &str, words: WordList) -> CrossgenResult<Self> {
    let (width, height, cells) = layout.lines().try_fold(
      (None, 0u32, vec![]),
      |(width, height, mut cells), line| -> CrossgenResult<_> {
        let line = line.trim();
        let row_width = line.chars().count();
        cells.extend(line.chars().map(|c| c == '_'));
        if let Some(width) = width {
          if row_width != width {
            return Err(
              CrossgenError::MalformedStructure(format!(
                "row lengths differ: {row_width} vs {width}"
              ))
              .into(),
            );
          }
        }

        Ok((Some(row_width), height + 1, cells))
      },
    )?;

    let width =
      width.ok_or_else(|| CrossgenError::MalformedStructure("empty layout".to_owned()))? as u32;
    let grid = Grid::from_vec(cells, width, height)?;

    let variables: Vec<_> = Self::fill_runs(&grid)
      .filter(|&(_, length)| length >= MIN_VARIABLE_LENGTH)
      .map(|(pos, length)| Variable { pos, direction: Direction::Across, length })
      .chain(
        Self::fill_runs(grid.transpose())
          .filter(|&(_, length)| length >= MIN_VARIABLE_LENGTH)
          .map(|(pos, length)| Variable {
            pos: pos.transpose(),
            direction: Direction::Down,
            length,
          }),
      )
      .collect();

    if variables.is_empty() {
      return Err(
        CrossgenError::MalformedStructure(format!(
          "no fillable run of length {MIN_VARIABLE_LENGTH} or more"
        ))
        .into(),
      );
    }

    let mut cell_variables: HashMap<Pos, Vec<(VariableId, u32)>> = HashMap::new();
    for (id, variable) in variables.iter().enumerate() {
      for (index, pos) in variable.cells().enumerate() {
        cell_variables.entry(pos).or_default().push((id, index as u32));
      }
    }

    let mut overlaps = vec![vec![None; variables.len()]; variables.len()];
    for sharers in cell_variables.values() {
      for (&(x, i), &(y, j)) in sharers.iter().tuple_combinations::<(_, _)>() {
        debug_assert!(overlaps[x][y].is_none() && overlaps[y][x].is_none());
        let overlap = Overlap { index: i, other_index: j };
        overlaps[x][y] = Some(overlap);
        overlaps[y][x] = Some(overlap.swap());
      }
    }

    let neighbors: Vec<Vec<_>> = overlaps
      .iter()
      .map(|row| {
        row
          .iter()
          .enumerate()
          .filter_map(|(y, overlap)| overlap.is_some().then_some(y))
          .collect()
      })
      .collect();

    debug!(
      "{width}x{height} structure: {} variables, {} crossings",
      variables.len(),
      neighbors.iter().map(Vec::len).sum::<usize>() / 2
    );

    Ok(Self { grid, words, variables, overlaps, neighbors })
  }

  fn fill_runs<'a, G: Gridlike<bool> + 'a>(board: G) -> impl Iterator<Item = (Pos, u32)> + 'a {
    struct FillRuns<I> {
      x: u32,
      y: u32,
      iter: Option<I>,
    }

    impl<I> Iterator for FillRuns<I>
    where
      I: Iterator<Item = bool>,
    {
      type Item = (Pos, u32);

      fn next(&mut self) -> Option<(Pos, u32)> {
        let iter = self.iter.as_mut()?;

        loop {
          self.x += 1;
          match iter.next() {
            Some(true) => break,
            Some(false) => {}
            None => return None,
          }
        }
        let pos = Pos { x: (self.x - 1) as i32, y: self.y as i32 };
        let mut length = 1;

        loop {
          self.x += 1;
          match iter.next() {
            Some(true) => length += 1,
            Some(false) => break,
            None => {
              self.iter = None;
              break;
            }
          }
        }

        Some((pos, length))
      }
    }

    (0..board.height()).flat_map(move |y| {
      FillRuns { x: 0, y, iter: Some(board.iter_row(y).cloned()) }.collect::<Vec<_>>()
    })
  }

  pub fn width(&self) -> u32 {
    self.grid.width()
  }

  pub fn height(&self) -> u32 {
    self.grid.height()
  }

  pub fn fillable(&self, pos: Pos) -> bool {
    self.grid.get(pos).is_some_and(|&fillable| fillable)
  }

  pub(crate) fn grid(&self) -> &Grid<bool> {
    &self.grid
  }

  pub fn words(&self) -> &WordList {
    &self.words
  }

  pub fn variables(&self) -> &[Variable] {
    &self.variables
  }

  pub fn num_variables(&self) -> usize {
    self.variables.len()
  }

  pub fn variable(&self, id: VariableId) -> &Variable {
    &self.variables[id]
  }

  /// The crossing of x and y, if any. Symmetric up to `Overlap::swap`.
  pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<Overlap> {
    self.overlaps[x][y]
  }

  /// Ids of all variables sharing a cell with x, ascending.
  pub fn neighbors(&self, x: VariableId) -> &[VariableId] {
    &self.neighbors[x]
  }

  pub fn degree(&self, x: VariableId) -> usize {
    self.neighbors[x].len()
  }
}
