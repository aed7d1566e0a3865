//! # Periodic Table Module
//!
//! ## Purpose
//! Immutable, ordered collection of [`Element`] records indexed by atomic number,
//! symbol and name. It is the symbol table handed to the formula parser.
//!
//! ## Data Format
//! Tables are loaded from JSON:
//! ```json
//! {
//!   "elements": [
//!     { "atomic_number": 1, "name": "Hydrogen", "symbol": "H", "category": "Nonmetal",
//!       "isotopes": [ { "mass_number": 1, "mass": 1.00782503207, "abundance": 99.9885 } ] }
//!   ]
//! }
//! ```
//! A reference table covering the common elements is bundled with the crate
//! (see [`PeriodicTable::bundled`]).

use crate::Chemistry::element::{Category, Element};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUNDLED_TABLE: &str = include_str!("../../data/periodic_table.json");

/// error types for loading and validating periodic table data
#[derive(Debug, Error)]
pub enum PeriodicTableError {
    #[error("I/O error reading periodic table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid periodic table JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate atomic number {0}")]
    DuplicateAtomicNumber(u32),
    #[error("Duplicate element symbol \"{0}\"")]
    DuplicateSymbol(String),
    #[error("Element with atomic number {0} has an empty symbol")]
    EmptySymbol(u32),
    #[error("Element \"{0}\" has no isotopes")]
    NoIsotopes(String),
    #[error("Isotope abundances of element \"{0}\" total neither 0 nor 100 %")]
    InvalidAbundance(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsotopeEntry {
    mass_number: u32,
    mass: f64,
    #[serde(default)]
    abundance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ElementEntry {
    atomic_number: u32,
    name: String,
    symbol: String,
    #[serde(default)]
    category: Category,
    isotopes: Vec<IsotopeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableDocument {
    elements: Vec<ElementEntry>,
}

impl ElementEntry {
    fn into_element(self) -> Element {
        let isotopes: Vec<(u32, f64, f64)> = self
            .isotopes
            .iter()
            .map(|isotope| (isotope.mass_number, isotope.mass, isotope.abundance))
            .collect();
        Element::new(
            self.atomic_number,
            &self.name,
            &self.symbol,
            self.category,
            &isotopes,
        )
    }
}

/// Ordered element collection with lookup indexes
#[derive(Debug, Clone)]
pub struct PeriodicTable {
    /// sorted by atomic number
    elements: Vec<Element>,
    by_atomic_number: HashMap<u32, usize>,
    by_symbol: HashMap<String, usize>,
    /// keys are lower case
    by_name: HashMap<String, usize>,
}

impl PeriodicTable {
    /// Builds a table from element records, validating that atomic numbers and symbols
    /// are unique, symbols are non-empty, every element has isotopes and abundance totals
    /// are sound.
    pub fn new(elements: Vec<Element>) -> Result<Self, PeriodicTableError> {
        let mut elements: Vec<Element> = elements
            .into_iter()
            .filter(|element| !element.is_unknown())
            .collect();
        elements.sort();

        let mut by_atomic_number = HashMap::new();
        let mut by_symbol = HashMap::new();
        let mut by_name = HashMap::new();
        for (index, element) in elements.iter().enumerate() {
            if element.symbol().is_empty() {
                return Err(PeriodicTableError::EmptySymbol(element.atomic_number()));
            }
            if element.isotopes().is_empty() {
                return Err(PeriodicTableError::NoIsotopes(element.symbol().to_string()));
            }
            if !element.is_abundance_valid() {
                return Err(PeriodicTableError::InvalidAbundance(
                    element.symbol().to_string(),
                ));
            }
            if by_atomic_number
                .insert(element.atomic_number(), index)
                .is_some()
            {
                return Err(PeriodicTableError::DuplicateAtomicNumber(
                    element.atomic_number(),
                ));
            }
            if by_symbol
                .insert(element.symbol().to_string(), index)
                .is_some()
            {
                return Err(PeriodicTableError::DuplicateSymbol(
                    element.symbol().to_string(),
                ));
            }
            by_name.insert(element.name().to_lowercase(), index);
        }

        Ok(Self {
            elements,
            by_atomic_number,
            by_symbol,
            by_name,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, PeriodicTableError> {
        let document: TableDocument = serde_json::from_str(json)?;
        let elements = document
            .elements
            .into_iter()
            .map(ElementEntry::into_element)
            .collect();
        let table = Self::new(elements)?;
        debug!("parsed periodic table with {} elements", table.len());
        Ok(table)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PeriodicTableError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        info!(
            "Loaded periodic table with {} elements from '{}'",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// The reference table shipped with the crate
    pub fn bundled() -> Result<Self, PeriodicTableError> {
        Self::from_json_str(BUNDLED_TABLE)
    }

    /// Serialises the table back into the JSON document format
    pub fn to_json_string(&self) -> Result<String, PeriodicTableError> {
        let document = TableDocument {
            elements: self
                .elements
                .iter()
                .map(|element| ElementEntry {
                    atomic_number: element.atomic_number(),
                    name: element.name().to_string(),
                    symbol: element.symbol().to_string(),
                    category: element.category(),
                    isotopes: element
                        .isotopes()
                        .iter()
                        .map(|isotope| IsotopeEntry {
                            mass_number: isotope.mass_number(),
                            mass: isotope.mass(),
                            abundance: isotope.abundance(),
                        })
                        .collect(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, atomic_number: u32) -> Option<&Element> {
        self.by_atomic_number
            .get(&atomic_number)
            .map(|&index| &self.elements[index])
    }

    /// exact, case-sensitive symbol lookup
    pub fn by_symbol(&self, symbol: &str) -> Option<&Element> {
        self.by_symbol
            .get(symbol)
            .map(|&index| &self.elements[index])
    }

    /// case-insensitive name lookup
    pub fn by_name(&self, name: &str) -> Option<&Element> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.elements[index])
    }
}

impl<'a> IntoIterator for &'a PeriodicTable {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
