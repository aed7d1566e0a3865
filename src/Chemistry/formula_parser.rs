//! # Chemical Formula Parser
//!
//! Turns free-form formula text into a [`ChemicalComposition`].
//!
//! | Input              | Meaning                                               |
//! |--------------------|-------------------------------------------------------|
//! | `CH3COOH`          | elements with counts                                  |
//! | `(NH4)2SO4`        | groups in `()`, `{}` or `[]`, scaled by a count        |
//! | `^13C`, `13CO2`    | isotope of the element that follows                   |
//! | `?12.345`          | unknown element known only by its mass                |
//! | `Na+`, `SO4^2-`    | charge, only at the very end                          |
//! | `Fe{2}`            | braced count of the preceding element                 |
//!
//! Problems the parser can recover from are reported as [`FormulaWarning`]s; anything
//! else aborts with a [`FormulaError`] naming the offending text and the formula.
//! The parser holds no mutable state, so one instance can parse on many threads.

use crate::Chemistry::composition::{ChemicalComposition, CompositionError};
use crate::Chemistry::element::{Element, Isotope};
use crate::Chemistry::periodic_table::PeriodicTable;
use crate::Chemistry::symbol_matching::SymbolTable;
use log::{debug, warn};
use thiserror::Error;

/// fatal parse conditions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("Symbols \"{letters}\" cannot be matched in \"{formula}\".")]
    UnmatchedSymbols { letters: String, formula: String },
    #[error("Unknown isotope specified: \"{element}-{mass_number}\" in \"{formula}\".")]
    UnknownIsotope {
        element: String,
        mass_number: u32,
        formula: String,
    },
    #[error("Unexpected character \"{character}\" in \"{formula}\".")]
    UnexpectedCharacter { character: char, formula: String },
    #[error("Unexpected end of line after \"{specifier}\" in \"{formula}\".")]
    UnexpectedEnd { specifier: u32, formula: String },
    #[error("Unable to parse mass of unknown \"{text}\" in \"{formula}\".")]
    MalformedUnknownMass { text: String, formula: String },
    #[error("Mismatched brackets (stack underflow) at \"{character}\" in \"{formula}\".")]
    BracketUnderflow { character: char, formula: String },
    #[error("Unexpected character \"{character}\" after charge in \"{formula}\".")]
    TrailingAfterCharge { character: char, formula: String },
    #[error("Number \"{text}\" is out of range in \"{formula}\".")]
    NumberOverflow { text: String, formula: String },
    #[error("Atom count out of range ({source}) in \"{formula}\".")]
    CountOverflow {
        source: CompositionError,
        formula: String,
    },
}

/// recoverable parse conditions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaWarning {
    #[error("Formula string is empty.")]
    EmptyFormula,
    #[error("Proceeding with invalid capitalisation of symbol \"{symbol}\" in \"{formula}\".")]
    InvalidCapitalisation { symbol: String, formula: String },
    #[error("Ignoring extraneous whitespace.")]
    IgnoredWhitespace,
    #[error("Ignoring extraneous '{character}'.")]
    IgnoredCharacter { character: char },
    #[error("Mismatched brackets - \"{opening} {closing}\" - in \"{formula}\".")]
    MismatchedBrackets {
        opening: char,
        closing: char,
        formula: String,
    },
    #[error("Mismatched brackets (expecting closing bracket) in \"{formula}\".")]
    UnclosedBracket { formula: String },
}

fn closing_bracket(opening: char) -> char {
    match opening {
        '{' => '}',
        '[' => ']',
        _ => ')',
    }
}

/// The entry a letter run added last, so a braced count can re-scale it
#[derive(Debug, Clone)]
enum LastEntry {
    Element(Element, u32),
    Isotope(Isotope, u32),
}

/// Parses formulas against a fixed collection of elements
#[derive(Debug, Clone)]
pub struct ChemicalFormulaParser {
    elements: Vec<Element>,
    symbols: SymbolTable,
}

impl ChemicalFormulaParser {
    pub fn new(table: &PeriodicTable) -> Self {
        Self::from_elements(table.iter().cloned())
    }

    pub fn from_elements<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Element>,
    {
        let elements: Vec<Element> = elements.into_iter().collect();
        let symbols = SymbolTable::new(&elements);
        Self { elements, symbols }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Parses `formula`, logging warnings through the `log` facade
    pub fn parse(&self, formula: &str) -> Result<ChemicalComposition, FormulaError> {
        self.parse_with(formula, |warning| warn!("{}", warning))
    }

    /// Parses `formula` and returns the warnings alongside the composition
    pub fn parse_collecting(
        &self,
        formula: &str,
    ) -> Result<(ChemicalComposition, Vec<FormulaWarning>), FormulaError> {
        let mut warnings = Vec::new();
        let composition = self.parse_with(formula, |warning| warnings.push(warning))?;
        Ok((composition, warnings))
    }

    /// Parses `formula`, handing every warning to `on_warning`.
    ///
    /// An empty formula yields an empty composition and a single
    /// [`FormulaWarning::EmptyFormula`].
    pub fn parse_with<F>(
        &self,
        formula: &str,
        mut on_warning: F,
    ) -> Result<ChemicalComposition, FormulaError>
    where
        F: FnMut(FormulaWarning),
    {
        if formula.is_empty() {
            on_warning(FormulaWarning::EmptyFormula);
            return Ok(ChemicalComposition::new());
        }

        let composition = FormulaCursor::new(self, formula, &mut on_warning).run()?;
        debug!("parsed \"{}\" as {}", formula, composition);
        Ok(composition)
    }
}

/// State of one parse call
struct FormulaCursor<'p, 'w, F> {
    parser: &'p ChemicalFormulaParser,
    formula: &'p str,
    chars: Vec<char>,
    index: usize,
    /// compositions of the open groups, root at the bottom
    molecule_stack: Vec<ChemicalComposition>,
    /// open brackets, with the entry that preceded each
    bracket_stack: Vec<(char, Option<LastEntry>)>,
    isotope_specifier: Option<u32>,
    charge: Option<i32>,
    already_warned: Vec<char>,
    last_entry: Option<LastEntry>,
    on_warning: &'w mut F,
}

impl<'p, 'w, F> FormulaCursor<'p, 'w, F>
where
    F: FnMut(FormulaWarning),
{
    fn new(parser: &'p ChemicalFormulaParser, formula: &'p str, on_warning: &'w mut F) -> Self {
        Self {
            parser,
            formula,
            chars: formula.chars().collect(),
            index: 0,
            molecule_stack: vec![ChemicalComposition::new()],
            bracket_stack: Vec::new(),
            isotope_specifier: None,
            charge: None,
            already_warned: Vec::new(),
            last_entry: None,
            on_warning,
        }
    }

    fn unexpected(&self, character: char) -> FormulaError {
        FormulaError::UnexpectedCharacter {
            character,
            formula: self.formula.to_string(),
        }
    }

    fn overflow(&self, text: &str) -> FormulaError {
        FormulaError::NumberOverflow {
            text: text.to_string(),
            formula: self.formula.to_string(),
        }
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.chars.len()
    }

    fn next_char(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    /// consumes the digits following the cursor, leaving it on the last one
    fn take_digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(next) = self.next_char().filter(char::is_ascii_digit) {
            digits.push(next);
            self.index += 1;
        }
        digits
    }

    fn parse_count(&self, digits: &str) -> Result<u32, FormulaError> {
        digits.parse::<u32>().map_err(|_| self.overflow(digits))
    }

    fn count_overflow(&self, source: CompositionError) -> FormulaError {
        FormulaError::CountOverflow {
            source,
            formula: self.formula.to_string(),
        }
    }

    fn merge_into_top(&mut self, molecule: &ChemicalComposition) -> Result<(), FormulaError> {
        match self.molecule_stack.last() {
            Some(top) => {
                let merged = top
                    .try_with_molecule(molecule)
                    .map_err(|e| self.count_overflow(e))?;
                if let Some(top) = self.molecule_stack.last_mut() {
                    *top = merged;
                }
            }
            None => self.molecule_stack.push(molecule.clone()),
        }
        Ok(())
    }

    fn run(mut self) -> Result<ChemicalComposition, FormulaError> {
        while self.index < self.chars.len() {
            let current = self.chars[self.index];

            if current.is_alphabetic() {
                self.letters()?;
            } else if matches!(current, '(' | '{' | '[') {
                self.open_group(current)?;
            } else if matches!(current, ')' | '}' | ']') {
                self.close_group(current)?;
            } else if current.is_ascii_digit() || current == '^' {
                self.prefix_number(current)?;
            } else if self.isotope_specifier.is_none()
                && (matches!(current, ' ' | '.' | '\t') || (current == '-' && !self.is_last()))
            {
                self.ignore(current);
            } else if self.isotope_specifier.is_none() && current == '?' {
                self.unknown_mass()?;
            } else if current == '+' || current == '-' {
                self.charge_sign(current)?;
            } else {
                return Err(self.unexpected(current));
            }

            self.index += 1;
        }

        if let Some(specifier) = self.isotope_specifier {
            // cannot end on an isotope marker
            return Err(FormulaError::UnexpectedEnd {
                specifier,
                formula: self.formula.to_string(),
            });
        }

        while self.molecule_stack.len() > 1 {
            (self.on_warning)(FormulaWarning::UnclosedBracket {
                formula: self.formula.to_string(),
            });
            if let Some(group) = self.molecule_stack.pop() {
                self.merge_into_top(&group)?;
            }
        }

        let root = self.molecule_stack.pop().unwrap_or_default();
        Ok(match self.charge {
            Some(charge) => root.with_charge(charge),
            None => root,
        })
    }

    fn letters(&mut self) -> Result<(), FormulaError> {
        let start = self.index;
        while self.next_char().is_some_and(char::is_alphabetic) {
            self.index += 1;
        }
        let run = &self.chars[start..=self.index];

        let matched =
            self.parser
                .symbols
                .match_symbols(run)
                .ok_or_else(|| FormulaError::UnmatchedSymbols {
                    letters: run.iter().collect(),
                    formula: self.formula.to_string(),
                })?;
        for symbol in matched.iter().filter(|symbol| symbol.unconventional) {
            (self.on_warning)(FormulaWarning::InvalidCapitalisation {
                symbol: symbol.element.symbol().to_string(),
                formula: self.formula.to_string(),
            });
        }
        let mut elements: Vec<Element> = matched.into_iter().map(|symbol| symbol.element).collect();

        // an isotope specifier applies to the first element of the run
        let isotope = match self.isotope_specifier.take() {
            Some(mass_number) if !elements.is_empty() => {
                let first = elements.remove(0);
                let isotope = first.isotope(mass_number).cloned().ok_or_else(|| {
                    FormulaError::UnknownIsotope {
                        element: first.name().to_string(),
                        mass_number,
                        formula: self.formula.to_string(),
                    }
                })?;
                Some(isotope)
            }
            _ => None,
        };

        // a count applies to the last entry of the run only
        let digits = self.take_digits();
        let count = if digits.is_empty() {
            1
        } else {
            self.parse_count(&digits)?
        };

        let mut sub_molecule = ChemicalComposition::new();
        let last_element = elements.pop();
        sub_molecule = sub_molecule.with_elements(&elements);
        self.last_entry = match (last_element, isotope) {
            (Some(last), isotope) => {
                sub_molecule = sub_molecule
                    .try_with_element_count(&last, count)
                    .map_err(|e| self.count_overflow(e))?;
                if let Some(isotope) = &isotope {
                    sub_molecule = sub_molecule.with_isotope(isotope);
                }
                Some(LastEntry::Element(last, count))
            }
            (None, Some(isotope)) => {
                sub_molecule = sub_molecule.with_isotope_count(&isotope, count);
                Some(LastEntry::Isotope(isotope, count))
            }
            (None, None) => None,
        };

        self.merge_into_top(&sub_molecule)
    }

    fn open_group(&mut self, bracket: char) -> Result<(), FormulaError> {
        if self.isotope_specifier.is_some() {
            // isotopes apply to single elements only
            return Err(self.unexpected(bracket));
        }
        self.bracket_stack.push((bracket, self.last_entry.take()));
        self.molecule_stack.push(ChemicalComposition::new());
        Ok(())
    }

    fn close_group(&mut self, bracket: char) -> Result<(), FormulaError> {
        let Some((opening, entry_before)) = self.bracket_stack.pop() else {
            return Err(FormulaError::BracketUnderflow {
                character: bracket,
                formula: self.formula.to_string(),
            });
        };
        if closing_bracket(opening) != bracket {
            (self.on_warning)(FormulaWarning::MismatchedBrackets {
                opening,
                closing: bracket,
                formula: self.formula.to_string(),
            });
        }
        let group = self.molecule_stack.pop().unwrap_or_default();

        if let Some(count) = self.isotope_specifier.take() {
            // "Fe{2}": a bare number in brackets counts the entry before the bracket
            return match entry_before {
                Some(entry) if group.is_empty() => self.rescale_top(entry, count),
                _ => Err(self.unexpected(bracket)),
            };
        }

        let digits = self.take_digits();
        let group = if digits.is_empty() {
            group
        } else {
            let count = self.parse_count(&digits)?;
            group
                .with_multiplied_counts(i64::from(count))
                .map_err(|_| self.overflow(&digits))?
        };
        self.merge_into_top(&group)?;
        self.last_entry = None;
        Ok(())
    }

    /// multiplies the count of `entry` in the current group by `factor`
    fn rescale_top(&mut self, entry: LastEntry, factor: u32) -> Result<(), FormulaError> {
        let Some(top) = self.molecule_stack.last() else {
            return Ok(());
        };
        let overflow = || FormulaError::NumberOverflow {
            text: factor.to_string(),
            formula: self.formula.to_string(),
        };
        let (rescaled, entry) = match entry {
            LastEntry::Element(element, count) => {
                let scaled = count.checked_mul(factor).ok_or_else(overflow)?;
                let rescaled = top
                    .without_element_count(&element, count)
                    .try_with_element_count(&element, scaled)
                    .map_err(|e| self.count_overflow(e))?;
                (rescaled, LastEntry::Element(element, scaled))
            }
            LastEntry::Isotope(isotope, count) => {
                let scaled = count.checked_mul(factor).ok_or_else(overflow)?;
                let rescaled = top
                    .without_isotope_count(&isotope, count)
                    .try_with_isotope_count(&isotope, scaled)
                    .map_err(|e| self.count_overflow(e))?;
                (rescaled, LastEntry::Isotope(isotope, scaled))
            }
        };
        if let Some(top) = self.molecule_stack.last_mut() {
            *top = rescaled;
        }
        self.last_entry = Some(entry);
        Ok(())
    }

    /// digits or `^`: an isotope specifier for the next letter run, or a charge
    /// magnitude when a sign follows
    fn prefix_number(&mut self, current: char) -> Result<(), FormulaError> {
        let Some(next) = self.next_char() else {
            return Err(self.unexpected(current));
        };
        // "2^+": the caret only separates a charge magnitude from its sign
        if current == '^' && (next == '+' || next == '-') {
            return Ok(());
        }
        if self.isotope_specifier.is_some() {
            return Err(self.unexpected(current));
        }

        let mut digits = String::new();
        if current != '^' {
            digits.push(current);
        }
        digits.push_str(&self.take_digits());
        if digits.is_empty() {
            return Err(self.unexpected(next));
        }
        self.isotope_specifier = Some(self.parse_count(&digits)?);
        Ok(())
    }

    /// whitespace, dots and interior dashes are skipped; each distinct one is reported once
    fn ignore(&mut self, current: char) {
        if self.already_warned.contains(&current) {
            return;
        }
        self.already_warned.push(current);
        let warning = if current == ' ' {
            FormulaWarning::IgnoredWhitespace
        } else {
            FormulaWarning::IgnoredCharacter { character: current }
        };
        (self.on_warning)(warning);
    }

    fn unknown_mass(&mut self) -> Result<(), FormulaError> {
        if self.is_last() {
            return Err(self.unexpected('?'));
        }

        let mut text = self.take_digits();
        if self.next_char() == Some('.') {
            self.index += 1;
            text.push('.');
            text.push_str(&self.take_digits());
        }
        if text.is_empty() {
            let next = self.next_char().unwrap_or('?');
            return Err(self.unexpected(next));
        }
        let mass: f64 = text
            .parse()
            .map_err(|_| FormulaError::MalformedUnknownMass {
                text: text.clone(),
                formula: self.formula.to_string(),
            })?;

        let unknown = Element::unknown_mass(mass);
        let sub_molecule = ChemicalComposition::new().with_element(&unknown);
        self.merge_into_top(&sub_molecule)?;
        self.last_entry = Some(LastEntry::Element(unknown, 1));
        Ok(())
    }

    fn charge_sign(&mut self, sign: char) -> Result<(), FormulaError> {
        if let Some(next) = self.next_char() {
            // the charge terminates the formula
            return Err(FormulaError::TrailingAfterCharge {
                character: next,
                formula: self.formula.to_string(),
            });
        }

        let magnitude = match self.isotope_specifier.take() {
            Some(specifier) => {
                i32::try_from(specifier).map_err(|_| self.overflow(&specifier.to_string()))?
            }
            None => 1,
        };
        self.charge = Some(if sign == '-' { -magnitude } else { magnitude });
        Ok(())
    }
}
