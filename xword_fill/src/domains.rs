use std::collections::{HashSet, VecDeque};

use log::debug;
use xword_words::word_list::{WordId, WordList};

use crate::structure::{Structure, VariableId};

const NUM_LETTERS: usize = 26;

fn letter_index(letter: u8) -> usize {
  debug_assert!(letter.is_ascii_lowercase());
  (letter - b'a') as usize
}

/// Remaining candidates of one variable, plus per-cell letter occurrence
/// counts kept in sync with them so support and elimination queries are O(1).
#[derive(Clone, Debug, PartialEq, Eq)]
struct VarDomain {
  words: Vec<WordId>,
  letter_counts: Vec<[u32; NUM_LETTERS]>,
}

impl VarDomain {
  fn from_words(words: Vec<WordId>, length: u32, word_list: &WordList) -> Self {
    let mut letter_counts = vec![[0; NUM_LETTERS]; length as usize];
    for &word in &words {
      let bytes = word_list.bytes(word);
      debug_assert_eq!(bytes.len(), length as usize);
      for (cell, &letter) in bytes.iter().enumerate() {
        letter_counts[cell][letter_index(letter)] += 1;
      }
    }
    Self { words, letter_counts }
  }
}

/// Candidate words still available to each variable. Consistency enforcement
/// only ever shrinks these sets; search works on clones, one per recursion
/// level, so a failed branch cannot leak eliminations into its siblings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domains {
  domains: Vec<VarDomain>,
}

impl Domains {
  /// Candidate sets straight off the per-length word buckets. The length
  /// filter is the node-consistency step: no unary constraint survives it.
  pub fn from_structure(structure: &Structure) -> Self {
    let words = structure.words();
    Self {
      domains: structure
        .variables()
        .iter()
        .map(|variable| {
          VarDomain::from_words(
            words.words_with_length(variable.length).to_vec(),
            variable.length,
            words,
          )
        })
        .collect(),
    }
  }

  pub fn size(&self, var: VariableId) -> usize {
    self.domains[var].words.len()
  }

  pub fn is_empty(&self, var: VariableId) -> bool {
    self.domains[var].words.is_empty()
  }

  /// Remaining candidates of `var`, ascending by word id.
  pub fn candidates(&self, var: VariableId) -> &[WordId] {
    &self.domains[var].words
  }

  /// How many candidates of `var` have `letter` at `cell`.
  pub fn letter_count(&self, var: VariableId, cell: u32, letter: u8) -> u32 {
    self.domains[var].letter_counts[cell as usize][letter_index(letter)]
  }

  /// Removes every candidate of x with no matching candidate of y at their
  /// crossing. Returns whether anything was removed; variables that don't
  /// cross have nothing to revise.
  pub fn revise(&mut self, structure: &Structure, x: VariableId, y: VariableId) -> bool {
    let Some(overlap) = structure.overlap(x, y) else {
      return false;
    };
    debug_assert_ne!(x, y);

    let word_list = structure.words();
    let support = self.domains[y].letter_counts[overlap.other_index as usize];
    let VarDomain { words, letter_counts } = &mut self.domains[x];
    let before = words.len();
    words.retain(|&word| {
      let bytes = word_list.bytes(word);
      if support[letter_index(bytes[overlap.index as usize])] > 0 {
        return true;
      }
      for (cell, &letter) in bytes.iter().enumerate() {
        letter_counts[cell][letter_index(letter)] -= 1;
      }
      false
    });
    words.len() != before
  }

  /// Queue-based arc consistency. Starts from every crossing arc, or from
  /// `arcs` when given, and re-enqueues (z, x) for the other neighbors z of x
  /// whenever domain(x) shrinks. Returns false as soon as any domain empties
  /// (including one already empty on entry), true once the queue drains.
  pub fn ac3(
    &mut self,
    structure: &Structure,
    arcs: Option<Vec<(VariableId, VariableId)>>,
  ) -> bool {
    if (0..structure.num_variables()).any(|var| self.is_empty(var)) {
      return false;
    }

    let arcs = arcs.unwrap_or_else(|| {
      (0..structure.num_variables())
        .flat_map(|x| structure.neighbors(x).iter().map(move |&y| (x, y)))
        .collect()
    });

    let total = self.total_candidates();
    let mut queue: VecDeque<_> = arcs.into_iter().collect();
    let mut pending: HashSet<_> = queue.iter().copied().collect();

    while let Some((x, y)) = queue.pop_front() {
      pending.remove(&(x, y));
      if self.revise(structure, x, y) {
        if self.is_empty(x) {
          debug!("every candidate of variable {x} eliminated");
          return false;
        }
        for &z in structure.neighbors(x) {
          if z != y && pending.insert((z, x)) {
            queue.push_back((z, x));
          }
        }
      }
    }

    debug!(
      "arc consistency kept {} of {total} candidates",
      self.total_candidates()
    );
    true
  }

  /// Collapses domain(var) to one assigned word. Search only calls this on a
  /// clone, never on the store a caller still holds.
  pub fn restrict(&mut self, word_list: &WordList, var: VariableId, word: WordId) {
    debug_assert!(self.domains[var].words.contains(&word));
    let domain = &mut self.domains[var];
    domain.words.clear();
    domain.words.push(word);
    for counts in domain.letter_counts.iter_mut() {
      *counts = [0; NUM_LETTERS];
    }
    for (cell, &letter) in word_list.bytes(word).iter().enumerate() {
      domain.letter_counts[cell][letter_index(letter)] += 1;
    }
  }

  fn total_candidates(&self) -> usize {
    self.domains.iter().map(|domain| domain.words.len()).sum()
  }
}
