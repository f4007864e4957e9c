use std::{cmp::Reverse, fmt::Display};

use itertools::Itertools;
use log::debug;
use util::grid::Grid;
use xword_words::word_list::WordId;

use crate::{
  domains::Domains,
  structure::{Structure, VariableId},
};

/// Words chosen so far, one slot per variable. Built up and torn down one
/// step at a time during search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
  words: Vec<Option<WordId>>,
  assigned: usize,
}

impl Assignment {
  fn new(num_variables: usize) -> Self {
    Self { words: vec![None; num_variables], assigned: 0 }
  }

  fn assign(&mut self, var: VariableId, word: WordId) {
    debug_assert!(self.words[var].is_none());
    self.words[var] = Some(word);
    self.assigned += 1;
  }

  fn unassign(&mut self, var: VariableId) {
    debug_assert!(self.words[var].is_some());
    self.words[var] = None;
    self.assigned -= 1;
  }

  pub fn get(&self, var: VariableId) -> Option<WordId> {
    self.words[var]
  }

  pub fn is_complete(&self) -> bool {
    self.assigned == self.words.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (VariableId, WordId)> + '_ {
    self
      .words
      .iter()
      .enumerate()
      .filter_map(|(var, &word)| word.map(|word| (var, word)))
  }
}

/// Counters for one `solve` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
  /// Tentative assignments made during backtracking.
  pub states: u64,
  /// Assignments retracted after a dead end.
  pub backtracks: u64,
}

/// One cell of a rendered puzzle. Unfilled cells stay distinct from blocked
/// ones so partial assignments can be displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
  Letter(char),
  Empty,
  Blocked,
}

impl Tile {
  pub const fn to_char(self) -> char {
    match self {
      Tile::Letter(letter) => letter,
      Tile::Empty => '_',
      Tile::Blocked => '█',
    }
  }
}

impl Display for Tile {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_char())
  }
}

/// Backtracking search over a `Structure`: arc consistency up front, then
/// depth-first assignment with fewest-candidates-first variable selection and
/// least-constraining-value ordering, re-propagating on a cloned domain store
/// at every step.
pub struct Solver {
  structure: Structure,
}

impl Solver {
  pub fn new(structure: Structure) -> Self {
    Self { structure }
  }

  pub fn structure(&self) -> &Structure {
    &self.structure
  }

  /// The first solution in heuristic order, or None when the word list
  /// cannot fill the structure. Unsolvable is an ordinary outcome, not an
  /// error.
  pub fn solve(&self) -> Option<Assignment> {
    self.solve_with_stats().0
  }

  pub fn solve_with_stats(&self) -> (Option<Assignment>, SearchStats) {
    let mut stats = SearchStats::default();
    let mut domains = Domains::from_structure(&self.structure);
    if !domains.ac3(&self.structure, None) {
      debug!("no arc-consistent candidates to search");
      return (None, stats);
    }

    let mut assignment = Assignment::new(self.structure.num_variables());
    let solved = self.backtrack(&mut assignment, &domains, &mut stats);
    debug!(
      "search made {} assignments with {} backtracks",
      stats.states, stats.backtracks
    );
    (solved.then_some(assignment), stats)
  }

  fn backtrack(
    &self,
    assignment: &mut Assignment,
    domains: &Domains,
    stats: &mut SearchStats,
  ) -> bool {
    let Some(var) = self.select_unassigned_variable(assignment, domains) else {
      return true;
    };

    for word in self.order_domain_values(var, assignment, domains) {
      stats.states += 1;
      assignment.assign(var, word);
      if self.consistent(assignment) {
        let mut pruned = domains.clone();
        pruned.restrict(self.structure.words(), var, word);
        let arcs = self
          .structure
          .neighbors(var)
          .iter()
          .map(|&y| (y, var))
          .collect();
        if pruned.ac3(&self.structure, Some(arcs)) && self.backtrack(assignment, &pruned, stats) {
          return true;
        }
      }
      assignment.unassign(var);
      stats.backtracks += 1;
    }

    false
  }

  /// Fewest remaining candidates first, ties broken toward more crossings
  /// and then lower id. None once every variable is assigned.
  fn select_unassigned_variable(
    &self,
    assignment: &Assignment,
    domains: &Domains,
  ) -> Option<VariableId> {
    (0..self.structure.num_variables())
      .filter(|&var| assignment.get(var).is_none())
      .min_by_key(|&var| (domains.size(var), Reverse(self.structure.degree(var)), var))
  }

  /// Candidates of var, least constraining first: ascending by the number of
  /// candidates the value would eliminate across unassigned crossing
  /// variables. Ties keep ascending id order. Never mutates a domain.
  fn order_domain_values(
    &self,
    var: VariableId,
    assignment: &Assignment,
    domains: &Domains,
  ) -> Vec<WordId> {
    let words = self.structure.words();
    let unassigned: Vec<_> = self
      .structure
      .neighbors(var)
      .iter()
      .copied()
      .filter(|&y| assignment.get(y).is_none())
      .collect();

    domains
      .candidates(var)
      .iter()
      .copied()
      .sorted_by_key(|&word| {
        let bytes = words.bytes(word);
        unassigned
          .iter()
          .filter_map(|&y| {
            let overlap = self.structure.overlap(var, y)?;
            let supported =
              domains.letter_count(y, overlap.other_index, bytes[overlap.index as usize]);
            Some(domains.size(y) as u64 - supported as u64)
          })
          .sum::<u64>()
      })
      .collect()
  }

  /// A partial assignment is consistent when every assigned word fits its
  /// variable's length, agrees with every assigned crossing word, and no
  /// word is used twice.
  pub fn consistent(&self, assignment: &Assignment) -> bool {
    let words = self.structure.words();
    if assignment
      .iter()
      .map(|(_, word)| word)
      .duplicates()
      .next()
      .is_some()
    {
      return false;
    }

    assignment.iter().all(|(x, word)| {
      let bytes = words.bytes(word);
      bytes.len() == self.structure.variable(x).length as usize
        && self.structure.neighbors(x).iter().all(|&y| {
          match (assignment.get(y), self.structure.overlap(x, y)) {
            (Some(other), Some(overlap)) => {
              words.bytes(other)[overlap.other_index as usize] == bytes[overlap.index as usize]
            }
            _ => true,
          }
        })
    })
  }

  /// Projects an assignment, partial or complete, onto the grid.
  pub fn letter_grid(&self, assignment: &Assignment) -> Grid<Tile> {
    let mut grid = self
      .structure
      .grid()
      .map(|&fillable| if fillable { Tile::Empty } else { Tile::Blocked });
    for (var, word) in assignment.iter() {
      let variable = self.structure.variable(var);
      let bytes = self.structure.words().bytes(word);
      for (index, pos) in variable.cells().enumerate() {
        let letter = Tile::Letter(bytes[index] as char);
        if let Some(tile) = grid.get_mut(pos) {
          debug_assert!(
            matches!(*tile, Tile::Empty) || *tile == letter,
            "conflicting letters {tile} and {letter} at {pos}"
          );
          *tile = letter;
        }
      }
    }
    grid
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

  use googletest::prelude::*;
  use util::{grid::Gridlike, pos::Pos};
  use xword_words::word_list::{WordId, WordList};

  use crate::{domains::Domains, structure::Structure};

  use super::{Assignment, Solver, Tile};

  fn solver(layout: &str, words: &[&str]) -> Solver {
    Solver::new(
      Structure::from_layout(layout, WordList::from_words(words.iter().copied())).unwrap(),
    )
  }

  fn word_id(solver: &Solver, word: &str) -> WordId {
    solver
      .structure()
      .words()
      .iter()
      .find(|&(_, candidate)| candidate == word)
      .unwrap()
      .0
  }

  /// Across variable 0 at (0, 1) crossing down variable 1 at (0, 0) in cell
  /// (0, 1).
  const CROSS: &str = "_█
                       __";

  #[gtest]
  fn test_solves_crossing_pair() {
    let solver = solver(CROSS, &["ab", "ba", "cd"]);
    let solution = solver.solve();

    assert_that!(solution, some(anything()));
    let solution = solution.unwrap();
    expect_true!(solution.is_complete());
    expect_true!(solver.consistent(&solution));

    // Heuristic order is deterministic: the across slot tries "ab" first,
    // propagation leaves "ba" for the down slot.
    expect_that!(solution.get(0), some(eq(word_id(&solver, "ab"))));
    expect_that!(solution.get(1), some(eq(word_id(&solver, "ba"))));

    let grid = solver.letter_grid(&solution);
    expect_that!(grid.get(Pos::zero()), some(eq(&Tile::Letter('b'))));
    expect_that!(grid.get(Pos { x: 1, y: 0 }), some(eq(&Tile::Blocked)));
    expect_that!(grid.get(Pos { x: 0, y: 1 }), some(eq(&Tile::Letter('a'))));
    expect_that!(grid.get(Pos { x: 1, y: 1 }), some(eq(&Tile::Letter('b'))));
  }

  #[gtest]
  fn test_unsolvable_crossing_returns_none() {
    // No across candidate starts with the final letter of any down candidate.
    let solver = solver(CROSS, &["ab", "cd"]);
    expect_that!(solver.solve(), none());
  }

  #[gtest]
  fn test_no_word_of_required_length_short_circuits() {
    let solver = solver("___", &["ab", "cd"]);
    let (solution, stats) = solver.solve_with_stats();

    expect_that!(solution, none());
    expect_that!(stats.states, eq(0));
    expect_that!(stats.backtracks, eq(0));
  }

  #[gtest]
  fn test_repeated_words_are_rejected() {
    // Two disjoint slots of the same length but only one word to share.
    let solver = solver("__█__", &["ab"]);
    let (solution, stats) = solver.solve_with_stats();

    expect_that!(solution, none());
    expect_that!(stats.states, gt(0));
    expect_that!(stats.backtracks, gt(0));
  }

  #[gtest]
  fn test_disjoint_slots_take_distinct_words() {
    let solver = solver("__█__", &["ab", "cd"]);
    let solution = solver.solve();

    assert_that!(solution, some(anything()));
    let solution = solution.unwrap();
    let first = solution.get(0).unwrap();
    let second = solution.get(1).unwrap();
    expect_that!(first, not(eq(second)));
    expect_true!(solver.consistent(&solution));
  }

  #[gtest]
  fn test_isolated_variable_takes_only_fitting_word() {
    let solver = solver("___", &["cat", "ab"]);
    let solution = solver.solve();

    assert_that!(solution, some(anything()));
    expect_that!(
      solution.unwrap().get(0),
      some(eq(word_id(&solver, "cat")))
    );
  }

  #[gtest]
  fn test_isolated_variable_breaks_ties_by_word_order() {
    let solver = solver("___", &["cat", "dog"]);
    let solution = solver.solve();

    assert_that!(solution, some(anything()));
    expect_that!(
      solution.unwrap().get(0),
      some(eq(word_id(&solver, "cat")))
    );
  }

  #[gtest]
  fn test_full_grid_word_square() {
    let layout = "__
                  __";
    let solver = solver(layout, &["ab", "cd", "ac", "bd"]);
    let solution = solver.solve();

    assert_that!(solution, some(anything()));
    let solution = solution.unwrap();
    expect_true!(solution.is_complete());
    expect_true!(solver.consistent(&solution));
  }

  #[gtest]
  fn test_solving_twice_is_deterministic() {
    let layout = "__
                  __";
    let solver = solver(layout, &["ab", "cd", "ac", "bd", "zz"]);

    let (first, first_stats) = solver.solve_with_stats();
    let (second, second_stats) = solver.solve_with_stats();

    expect_that!(first, eq(&second));
    expect_that!(first_stats, eq(second_stats));
  }

  #[gtest]
  fn test_select_prefers_smaller_domain() {
    let solver = solver(CROSS, &["ab", "ba", "bb"]);
    let mut domains = Domains::from_structure(solver.structure());
    let assignment = Assignment::new(2);

    domains.restrict(solver.structure().words(), 1, word_id(&solver, "ab"));

    expect_that!(
      solver.select_unassigned_variable(&assignment, &domains),
      some(eq(1))
    );
  }

  #[gtest]
  fn test_select_breaks_ties_by_degree_then_id() {
    // Down variable 3 spans all three rows (degree 3); every other variable
    // crosses two. All domains share the same size, so degree decides, and
    // id breaks the tie between the two down variables.
    let layout = "___
                  __█
                  __█";
    let solver = solver(layout, &["abc", "def", "ab", "cd"]);
    let domains = Domains::from_structure(solver.structure());
    let mut assignment = Assignment::new(solver.structure().num_variables());

    expect_that!(
      solver.select_unassigned_variable(&assignment, &domains),
      some(eq(3))
    );

    assignment.assign(3, word_id(&solver, "abc"));
    expect_that!(
      solver.select_unassigned_variable(&assignment, &domains),
      some(eq(4))
    );
  }

  #[gtest]
  fn test_select_returns_none_when_complete() {
    let solver = solver("___", &["cat"]);
    let domains = Domains::from_structure(solver.structure());
    let mut assignment = Assignment::new(1);
    assignment.assign(0, 0);

    expect_that!(
      solver.select_unassigned_variable(&assignment, &domains),
      none()
    );
  }

  #[gtest]
  fn test_order_puts_least_constraining_value_first() {
    // Crossing letter tallies for the down slot's second cell: 'a' three
    // times, 'b' twice, 'c' never. The across candidates therefore eliminate
    // 2, 3, or 5 of the five down candidates.
    let solver = solver(CROSS, &["ca", "bb", "aa", "ab", "ba"]);
    let domains = Domains::from_structure(solver.structure());
    let assignment = Assignment::new(2);

    expect_that!(
      solver.order_domain_values(0, &assignment, &domains),
      container_eq(vec![2, 3, 1, 4, 0])
    );
  }

  #[gtest]
  fn test_order_ignores_assigned_neighbors() {
    let solver = solver(CROSS, &["ca", "bb", "aa", "ab", "ba"]);
    let domains = Domains::from_structure(solver.structure());
    let mut assignment = Assignment::new(2);
    assignment.assign(1, word_id(&solver, "aa"));

    expect_that!(
      solver.order_domain_values(0, &assignment, &domains),
      container_eq(vec![0, 1, 2, 3, 4])
    );
  }

  #[gtest]
  fn test_consistent_rejects_crossing_mismatch() {
    let solver = solver(CROSS, &["ab", "bb"]);
    let mut assignment = Assignment::new(2);
    assignment.assign(0, word_id(&solver, "ab"));
    assignment.assign(1, word_id(&solver, "bb"));

    expect_false!(solver.consistent(&assignment));
  }

  #[gtest]
  fn test_consistent_accepts_partial_assignment() {
    let solver = solver(CROSS, &["ab", "bb"]);
    let mut assignment = Assignment::new(2);
    assignment.assign(0, word_id(&solver, "ab"));

    expect_true!(solver.consistent(&assignment));
  }

  #[gtest]
  fn test_letter_grid_renders_partial_assignment() {
    let solver = solver(CROSS, &["ab", "ba"]);
    let mut assignment = Assignment::new(2);
    assignment.assign(1, word_id(&solver, "ab"));

    let grid = solver.letter_grid(&assignment);
    expect_that!(grid.get(Pos::zero()), some(eq(&Tile::Letter('a'))));
    expect_that!(grid.get(Pos { x: 0, y: 1 }), some(eq(&Tile::Letter('b'))));
    expect_that!(grid.get(Pos { x: 1, y: 0 }), some(eq(&Tile::Blocked)));
    expect_that!(grid.get(Pos { x: 1, y: 1 }), some(eq(&Tile::Empty)));
  }
}
