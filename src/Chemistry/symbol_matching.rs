//! Splitting an unbroken run of letters into element symbols.
//!
//! `"Co"` may be cobalt or carbon + oxygen, `"CO"` carbon + oxygen or (badly
//! capitalised) cobalt. Capitalisation decides which reading is tried first:
//! a symbol is read as two letters when the second letter is lower case, otherwise
//! as one letter. When the preferred reading leads nowhere the search backtracks
//! and tries the other one.
//!
//! Failures are memoised per (symbol length, position): once a symbol of a given
//! length starting at a given position is known not to lead to a complete
//! decomposition it is never tried again. Each of the 2N choices is therefore
//! expanded at most once and the search always terminates.

use crate::Chemistry::element::Element;
use std::collections::{BTreeSet, HashMap};

/// A symbol found in a letter run
#[derive(Debug, Clone)]
pub(crate) struct MatchedSymbol {
    pub element: Element,
    /// the letters were not capitalised as the symbol is (`co`, `CO` for Co, `h` for H)
    pub unconventional: bool,
}

struct Frame {
    start: usize,
    /// symbol lengths in order of preference
    order: [usize; 2],
    tried: usize,
    element: Option<Element>,
}

/// Case-insensitive index of the one- and two-letter symbols of an element collection
#[derive(Debug, Clone, Default)]
pub(crate) struct SymbolTable {
    one_letter: HashMap<String, Element>,
    two_letter: HashMap<String, Element>,
}

fn lower(letters: &[char]) -> String {
    letters.iter().flat_map(|c| c.to_lowercase()).collect()
}

impl SymbolTable {
    /// The first element listed for a symbol wins. Symbols of other lengths cannot
    /// appear in a formula and are skipped.
    pub fn new<'a, I>(elements: I) -> Self
    where
        I: IntoIterator<Item = &'a Element>,
    {
        let mut table = SymbolTable::default();
        for element in elements {
            let key = element.symbol().to_lowercase();
            let map = match element.symbol().chars().count() {
                1 => &mut table.one_letter,
                2 => &mut table.two_letter,
                _ => continue,
            };
            map.entry(key).or_insert_with(|| element.clone());
        }
        table
    }

    fn lookup(&self, letters: &[char]) -> Option<&Element> {
        match letters.len() {
            1 => self.one_letter.get(&lower(letters)),
            2 => self.two_letter.get(&lower(letters)),
            _ => None,
        }
    }

    fn preference(letters: &[char], index: usize) -> [usize; 2] {
        if index + 1 < letters.len() && letters[index + 1].is_lowercase() {
            [2, 1]
        } else {
            [1, 2]
        }
    }

    fn unconventional(letters: &[char], start: usize, len: usize) -> bool {
        letters[start].is_lowercase() || (len == 2 && letters[start + 1].is_uppercase())
    }

    /// Decomposes `letters` into known symbols. Returns `None` when no decomposition
    /// exists.
    pub fn match_symbols(&self, letters: &[char]) -> Option<Vec<MatchedSymbol>> {
        let n = letters.len();
        // failed[0]: one-letter symbol at index fails, failed[1]: two-letter
        let mut failed: [BTreeSet<usize>; 2] = [BTreeSet::new(), BTreeSet::new()];
        let mut frames: Vec<Frame> = Vec::new();
        let mut index = 0;

        'search: while index < n {
            frames.push(Frame {
                start: index,
                order: Self::preference(letters, index),
                tried: 0,
                element: None,
            });

            loop {
                let frame = frames.last_mut()?;
                if frame.tried == frame.order.len() {
                    // every reading at this position failed, so did the choice leading here
                    frames.pop();
                    let previous = frames.last()?;
                    let len = previous.order[previous.tried - 1];
                    failed[len - 1].insert(previous.start);
                    continue;
                }

                let len = frame.order[frame.tried];
                frame.tried += 1;
                let start = frame.start;
                if start + len > n || failed[len - 1].contains(&start) {
                    failed[len - 1].insert(start);
                    continue;
                }
                match self.lookup(&letters[start..start + len]) {
                    Some(element) => {
                        frame.element = Some(element.clone());
                        index = start + len;
                        continue 'search;
                    }
                    None => {
                        failed[len - 1].insert(start);
                    }
                }
            }
        }

        frames
            .into_iter()
            .map(|frame| {
                let len = frame.order[frame.tried - 1];
                frame.element.map(|element| MatchedSymbol {
                    element,
                    unconventional: Self::unconventional(letters, frame.start, len),
                })
            })
            .collect()
    }
}
