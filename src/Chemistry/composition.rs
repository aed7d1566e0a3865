//! # Chemical Composition Module
//!
//! ## Purpose
//! Immutable value type describing the content of one molecular formula: a multiset of
//! element counts, a multiset of isotope counts and a net charge.
//!
//! ## Semantics
//! - Every `with_*` operation returns a new composition; the receiver is never changed.
//! - Counts are non-negative (`u32`). The plain `with_*` additions saturate at
//!   `u32::MAX`; the `try_with_*` additions and scaling report overflow as an error.
//! - Entries with a count of zero are never stored, so the empty composition is the
//!   single canonical "nothing" value.
//! - The charge defaults to 1. A charge of 0 means explicitly neutral.
//! - Equality and hashing look at the element and isotope counts only; two compositions
//!   that differ only in charge compare equal.
//! - [`fmt::Display`] renders the canonical display string (`CH4^13C`), which is a lossy
//!   projection: charge and bracket grouping are not rendered.

use crate::Chemistry::element::{Element, Isotope};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// default charge of a composition that has not been given one
pub const DEFAULT_CHARGE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("Invalid argument: cannot multiply counts by negative value {0}")]
    InvalidArgument(i64),
    #[error("Count overflow: {count} x {factor} does not fit in an atom count")]
    CountOverflow { count: u32, factor: i64 },
    #[error("Count overflow: {count} + {added} does not fit in an atom count")]
    AdditionOverflow { count: u32, added: u32 },
}

#[derive(Debug, Clone)]
pub struct ChemicalComposition {
    /// elements of unspecified isotope
    elements: BTreeMap<Element, u32>,
    /// elements of specified isotope
    isotopes: BTreeMap<Isotope, u32>,
    charge: i32,
}

impl Default for ChemicalComposition {
    fn default() -> Self {
        Self::new()
    }
}

fn add_count<K: Ord + Clone>(counts: &mut BTreeMap<K, u32>, key: &K, count: u32) {
    if count == 0 {
        return;
    }
    let entry = counts.entry(key.clone()).or_insert(0);
    *entry = entry.saturating_add(count);
}

fn checked_add_count<K: Ord + Clone>(
    counts: &mut BTreeMap<K, u32>,
    key: &K,
    count: u32,
) -> Result<(), CompositionError> {
    if count == 0 {
        return Ok(());
    }
    let entry = counts.entry(key.clone()).or_insert(0);
    *entry = entry
        .checked_add(count)
        .ok_or(CompositionError::AdditionOverflow {
            count: *entry,
            added: count,
        })?;
    Ok(())
}

fn scale_counts<K: Ord + Clone>(
    counts: &BTreeMap<K, u32>,
    factor: i64,
) -> Result<BTreeMap<K, u32>, CompositionError> {
    counts
        .iter()
        .map(|(key, &count)| {
            let scaled = u64::from(count)
                .checked_mul(factor as u64)
                .and_then(|scaled| u32::try_from(scaled).ok())
                .ok_or(CompositionError::CountOverflow { count, factor })?;
            Ok((key.clone(), scaled))
        })
        .collect()
}

impl ChemicalComposition {
    /// empty composition with the default charge
    pub fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
            isotopes: BTreeMap::new(),
            charge: DEFAULT_CHARGE,
        }
    }

    /// the canonical empty composition
    pub fn nothing() -> Self {
        Self::new()
    }

    // add a single element
    pub fn with_element(&self, element: &Element) -> Self {
        self.with_element_count(element, 1)
    }

    // add a certain amount of a single element
    pub fn with_element_count(&self, element: &Element, count: u32) -> Self {
        let mut merged = self.clone();
        add_count(&mut merged.elements, element, count);
        merged
    }

    pub fn with_isotope(&self, isotope: &Isotope) -> Self {
        self.with_isotope_count(isotope, 1)
    }

    pub fn with_isotope_count(&self, isotope: &Isotope, count: u32) -> Self {
        let mut merged = self.clone();
        add_count(&mut merged.isotopes, isotope, count);
        merged
    }

    /// one of each element in the sequence (repeats accumulate)
    pub fn with_elements<'a, I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = &'a Element>,
    {
        self.with_elements_count(elements, 1)
    }

    /// `count` of each element in the sequence
    pub fn with_elements_count<'a, I>(&self, elements: I, count: u32) -> Self
    where
        I: IntoIterator<Item = &'a Element>,
    {
        let mut merged = self.clone();
        for element in elements {
            add_count(&mut merged.elements, element, count);
        }
        merged
    }

    /// different amounts of each element, e.g. from a map of element to count
    pub fn with_element_counts<'a, I>(&self, counts: I) -> Self
    where
        I: IntoIterator<Item = (&'a Element, &'a u32)>,
    {
        let mut merged = self.clone();
        for (element, &count) in counts {
            add_count(&mut merged.elements, element, count);
        }
        merged
    }

    pub fn with_isotopes<'a, I>(&self, isotopes: I) -> Self
    where
        I: IntoIterator<Item = &'a Isotope>,
    {
        self.with_isotopes_count(isotopes, 1)
    }

    pub fn with_isotopes_count<'a, I>(&self, isotopes: I, count: u32) -> Self
    where
        I: IntoIterator<Item = &'a Isotope>,
    {
        let mut merged = self.clone();
        for isotope in isotopes {
            add_count(&mut merged.isotopes, isotope, count);
        }
        merged
    }

    pub fn with_isotope_counts<'a, I>(&self, counts: I) -> Self
    where
        I: IntoIterator<Item = (&'a Isotope, &'a u32)>,
    {
        let mut merged = self.clone();
        for (isotope, &count) in counts {
            add_count(&mut merged.isotopes, isotope, count);
        }
        merged
    }

    /// Adds the element and isotope counts of `molecule`. The charge of `molecule` is
    /// not merged.
    pub fn with_molecule(&self, molecule: &ChemicalComposition) -> Self {
        self.with_element_counts(&molecule.elements)
            .with_isotope_counts(&molecule.isotopes)
    }

    /// Like [`Self::with_element_count`], but a sum past `u32::MAX` is an error
    pub fn try_with_element_count(
        &self,
        element: &Element,
        count: u32,
    ) -> Result<Self, CompositionError> {
        let mut merged = self.clone();
        checked_add_count(&mut merged.elements, element, count)?;
        Ok(merged)
    }

    pub fn try_with_isotope_count(
        &self,
        isotope: &Isotope,
        count: u32,
    ) -> Result<Self, CompositionError> {
        let mut merged = self.clone();
        checked_add_count(&mut merged.isotopes, isotope, count)?;
        Ok(merged)
    }

    /// Checked [`Self::with_molecule`]
    pub fn try_with_molecule(
        &self,
        molecule: &ChemicalComposition,
    ) -> Result<Self, CompositionError> {
        let mut merged = self.clone();
        for (element, &count) in &molecule.elements {
            checked_add_count(&mut merged.elements, element, count)?;
        }
        for (isotope, &count) in &molecule.isotopes {
            checked_add_count(&mut merged.isotopes, isotope, count)?;
        }
        Ok(merged)
    }

    /// Scales every count by `factor`. A factor of 0 clears all counts; a negative factor
    /// is rejected.
    pub fn with_multiplied_counts(&self, factor: i64) -> Result<Self, CompositionError> {
        if factor < 0 {
            return Err(CompositionError::InvalidArgument(factor));
        }
        if factor == 0 {
            return Ok(Self {
                elements: BTreeMap::new(),
                isotopes: BTreeMap::new(),
                charge: self.charge,
            });
        }
        Ok(Self {
            elements: scale_counts(&self.elements, factor)?,
            isotopes: scale_counts(&self.isotopes, factor)?,
            charge: self.charge,
        })
    }

    pub fn with_charge(&self, charge: i32) -> Self {
        Self {
            elements: self.elements.clone(),
            isotopes: self.isotopes.clone(),
            charge,
        }
    }

    /// Removes up to `count` of an element. Used by the parser to re-scale the last
    /// entry of a group.
    pub(crate) fn without_element_count(&self, element: &Element, count: u32) -> Self {
        let mut reduced = self.clone();
        if let Some(current) = reduced.elements.get_mut(element) {
            *current = current.saturating_sub(count);
            if *current == 0 {
                reduced.elements.remove(element);
            }
        }
        reduced
    }

    pub(crate) fn without_isotope_count(&self, isotope: &Isotope, count: u32) -> Self {
        let mut reduced = self.clone();
        if let Some(current) = reduced.isotopes.get_mut(isotope) {
            *current = current.saturating_sub(count);
            if *current == 0 {
                reduced.isotopes.remove(isotope);
            }
        }
        reduced
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    /// element counts in ascending atomic-number order
    pub fn element_counts(&self) -> &BTreeMap<Element, u32> {
        &self.elements
    }

    /// isotope counts in ascending mass-number order
    pub fn isotope_counts(&self) -> &BTreeMap<Isotope, u32> {
        &self.isotopes
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.keys()
    }

    pub fn isotopes(&self) -> impl Iterator<Item = &Isotope> {
        self.isotopes.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.isotopes.is_empty()
    }

    fn mass_with<F>(&self, element_mass: F, charge: i32) -> f64
    where
        F: Fn(&Element) -> f64,
    {
        let mut mass: f64 = self
            .elements
            .iter()
            .map(|(element, &count)| element_mass(element) * f64::from(count))
            .sum();
        mass += self
            .isotopes
            .iter()
            .map(|(isotope, &count)| isotope.mass() * f64::from(count))
            .sum::<f64>();
        if charge != 0 {
            mass /= f64::from(charge.unsigned_abs());
        }
        mass
    }

    /// average mass effective at charge 1
    pub fn average_mass(&self) -> f64 {
        self.average_mass_at_charge(1)
    }

    /// Average mass divided by `|charge|`; a charge of 0 applies no division
    pub fn average_mass_at_charge(&self, charge: i32) -> f64 {
        self.mass_with(Element::average_mass, charge)
    }

    pub fn monoisotopic_mass(&self) -> f64 {
        self.monoisotopic_mass_at_charge(1)
    }

    pub fn monoisotopic_mass_at_charge(&self, charge: i32) -> f64 {
        self.mass_with(Element::monoisotopic_mass, charge)
    }

    pub fn contains_element(&self, element: &Element) -> bool {
        self.elements.contains_key(element)
    }

    pub fn contains_isotope(&self, isotope: &Isotope) -> bool {
        self.isotopes.contains_key(isotope)
    }

    pub fn contains_isotope_of(&self, element: &Element) -> bool {
        self.isotopes.keys().any(|isotope| isotope.belongs_to(element))
    }

    pub fn contains_element_or_isotope_of(&self, element: &Element) -> bool {
        self.contains_element(element) || self.contains_isotope_of(element)
    }

    pub fn element_count(&self, element: &Element) -> u32 {
        self.elements.get(element).copied().unwrap_or(0)
    }

    pub fn isotope_count(&self, isotope: &Isotope) -> u32 {
        self.isotopes.get(isotope).copied().unwrap_or(0)
    }

    /// total count of isotopes belonging to `element`, widened like [`Self::atom_count`]
    pub fn isotope_of_count(&self, element: &Element) -> u64 {
        self.isotopes
            .iter()
            .filter(|(isotope, _)| isotope.belongs_to(element))
            .map(|(_, &count)| u64::from(count))
            .sum()
    }

    /// bare element count plus the counts of its isotopes
    pub fn element_or_isotope_of_count(&self, element: &Element) -> u64 {
        u64::from(self.element_count(element)) + self.isotope_of_count(element)
    }

    /// sum of all element and isotope counts
    pub fn atom_count(&self) -> u64 {
        self.elements
            .values()
            .chain(self.isotopes.values())
            .map(|&count| u64::from(count))
            .sum()
    }

    /// Display string with HTML markup: counts as `<sub>`, mass numbers as `<sup>`
    pub fn to_html(&self) -> String {
        let mut name = String::new();
        for (element, &count) in &self.elements {
            name.push_str(element.symbol());
            if count > 1 {
                name.push_str(&format!("<sub>{}</sub>", count));
            }
        }
        for (isotope, &count) in &self.isotopes {
            name.push_str(&format!(
                "<sup>{}</sup>{}",
                isotope.mass_number(),
                isotope.symbol()
            ));
            if count > 1 {
                name.push_str(&format!("<sub>{}</sub>", count));
            }
        }
        name
    }
}

impl fmt::Display for ChemicalComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (element, &count) in &self.elements {
            write!(f, "{}", element.symbol())?;
            if count > 1 {
                write!(f, "{}", count)?;
            }
        }
        for (isotope, &count) in &self.isotopes {
            write!(f, "^{}{}", isotope.mass_number(), isotope.symbol())?;
            if count > 1 {
                write!(f, "{}", count)?;
            }
        }
        Ok(())
    }
}

impl PartialEq for ChemicalComposition {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements && self.isotopes == other.isotopes
    }
}

impl Eq for ChemicalComposition {}

impl Hash for ChemicalComposition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.elements.hash(state);
        self.isotopes.hash(state);
    }
}
