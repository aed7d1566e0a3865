//! # Element and Isotope records
//!
//! Immutable reference data for the formula parser and the composition algebra.
//!
//! - **Isotope**: mass number, exact mass, natural abundance (percent scale) and the
//!   atomic number / symbol of the element it belongs to. The back-reference is a
//!   lookup key, not ownership.
//! - **Element**: either a `Known` record from a periodic table (shared through `Arc`,
//!   so cloning is cheap) or the synthetic `UnknownMass` element created for `?12.345`
//!   placeholders in a formula.
//!
//! Elements order by atomic number; unknown-mass elements all have atomic number 0
//! and order between themselves by mass. Isotopes order by mass number.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Symbol used for the synthetic unknown-mass element
pub const UNKNOWN_SYMBOL: &str = "Uk";
/// Name used for the synthetic unknown-mass element
pub const UNKNOWN_NAME: &str = "Unknown element";

/// abundance totals closer than this to 100 % count as complete natural-occurrence data
pub const ABUNDANCE_TOLERANCE: f64 = 1e-6;

/// Category enum: chemical family of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    None,
    Alkali,
    Alkaline,
    Lanthanide,
    Actinide,
    Transition,
    PoorMetal,
    Metalloid,
    Nonmetal,
    Halogen,
    NobleGas,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::None,
        Category::Alkali,
        Category::Alkaline,
        Category::Lanthanide,
        Category::Actinide,
        Category::Transition,
        Category::PoorMetal,
        Category::Metalloid,
        Category::Nonmetal,
        Category::Halogen,
        Category::NobleGas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::None => "None",
            Category::Alkali => "Alkali",
            Category::Alkaline => "Alkaline",
            Category::Lanthanide => "Lanthanide",
            Category::Actinide => "Actinide",
            Category::Transition => "Transition",
            Category::PoorMetal => "Poor Metal",
            Category::Metalloid => "Metalloid",
            Category::Nonmetal => "Nonmetal",
            Category::Halogen => "Halogen",
            Category::NobleGas => "Noble Gas",
        }
    }

    /// Look a category up by its display name. Unrecognised names map to `None`.
    pub fn from_name(name: &str) -> Category {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == name)
            .unwrap_or(Category::None)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Category::from_name(&name)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

/// A nuclide of an element
#[derive(Debug, Clone)]
pub struct Isotope {
    mass_number: u32,
    mass: f64,
    abundance: f64,
    atomic_number: u32,
    symbol: Arc<str>,
}

impl Isotope {
    pub fn mass_number(&self) -> u32 {
        self.mass_number
    }

    /// exact mass in Da
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// natural abundance, percent scale
    pub fn abundance(&self) -> f64 {
        self.abundance
    }

    /// atomic number of the owning element
    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    /// symbol of the owning element
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// true if this isotope is one of `element`'s isotopes
    pub fn belongs_to(&self, element: &Element) -> bool {
        element.isotopes().contains(self)
    }
}

impl PartialEq for Isotope {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Isotope {}

impl PartialOrd for Isotope {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Isotope {
    // mass number first; the mass tie-break only separates unknown-mass isotopes
    fn cmp(&self, other: &Self) -> Ordering {
        self.mass_number
            .cmp(&other.mass_number)
            .then(self.atomic_number.cmp(&other.atomic_number))
            .then(self.mass.total_cmp(&other.mass))
    }
}

impl Hash for Isotope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mass_number.hash(state);
        self.atomic_number.hash(state);
        self.mass.to_bits().hash(state);
    }
}

impl fmt::Display for Isotope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "^{}{}", self.mass_number, self.symbol)
    }
}

/// Reference record of a chemical element as supplied by a periodic table
#[derive(Debug, Clone)]
pub struct ElementRecord {
    atomic_number: u32,
    name: String,
    symbol: String,
    category: Category,
    /// sorted by mass number
    isotopes: Vec<Isotope>,
}

/// Chemical element: a periodic-table record or a synthetic element of unknown identity
/// known only by its mass
#[derive(Debug, Clone)]
pub enum Element {
    Known(Arc<ElementRecord>),
    UnknownMass(Isotope),
}

impl Element {
    /// Builds a known element. `isotopes` are `(mass_number, mass, abundance)` triples in
    /// any order; they are stored sorted by mass number and duplicates of a mass number
    /// keep their first occurrence.
    pub fn new(
        atomic_number: u32,
        name: &str,
        symbol: &str,
        category: Category,
        isotopes: &[(u32, f64, f64)],
    ) -> Element {
        let shared_symbol: Arc<str> = Arc::from(symbol);
        let mut isotopes: Vec<Isotope> = isotopes
            .iter()
            .map(|&(mass_number, mass, abundance)| Isotope {
                mass_number,
                mass,
                abundance,
                atomic_number,
                symbol: shared_symbol.clone(),
            })
            .collect();
        isotopes.sort_by_key(|isotope| isotope.mass_number);
        isotopes.dedup_by_key(|isotope| isotope.mass_number);

        Element::Known(Arc::new(ElementRecord {
            atomic_number,
            name: name.to_string(),
            symbol: symbol.to_string(),
            category,
            isotopes,
        }))
    }

    /// Synthetic element with a single isotope of the given mass and abundance 1.
    /// The mass number is the truncated mass.
    pub fn unknown_mass(mass: f64) -> Element {
        Element::UnknownMass(Isotope {
            mass_number: mass as u32,
            mass,
            abundance: 1.0,
            atomic_number: 0,
            symbol: Arc::from(UNKNOWN_SYMBOL),
        })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Element::UnknownMass(_))
    }

    pub fn atomic_number(&self) -> u32 {
        match self {
            Element::Known(record) => record.atomic_number,
            Element::UnknownMass(_) => 0,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Element::Known(record) => &record.name,
            Element::UnknownMass(_) => UNKNOWN_NAME,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Element::Known(record) => &record.symbol,
            Element::UnknownMass(_) => UNKNOWN_SYMBOL,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Element::Known(record) => record.category,
            Element::UnknownMass(_) => Category::None,
        }
    }

    /// all isotopes sorted by mass number
    pub fn isotopes(&self) -> &[Isotope] {
        match self {
            Element::Known(record) => &record.isotopes,
            Element::UnknownMass(isotope) => std::slice::from_ref(isotope),
        }
    }

    pub fn isotope(&self, mass_number: u32) -> Option<&Isotope> {
        self.isotopes()
            .iter()
            .find(|isotope| isotope.mass_number == mass_number)
    }

    pub fn naturally_occurring_isotopes(&self) -> impl Iterator<Item = &Isotope> {
        self.isotopes()
            .iter()
            .filter(|isotope| isotope.abundance > 0.0)
    }

    pub fn is_naturally_occurring(&self) -> bool {
        self.naturally_occurring_isotopes().next().is_some()
    }

    /// Abundance-weighted mean of the naturally occurring isotope masses, or the plain
    /// mean of all isotope masses if none occur naturally.
    pub fn average_mass(&self) -> f64 {
        let total_abundance: f64 = self
            .naturally_occurring_isotopes()
            .map(|isotope| isotope.abundance)
            .sum();
        if total_abundance > 0.0 {
            let weighted: f64 = self
                .naturally_occurring_isotopes()
                .map(|isotope| isotope.mass * isotope.abundance)
                .sum();
            return weighted / total_abundance;
        }

        let isotopes = self.isotopes();
        if isotopes.is_empty() {
            return 0.0;
        }
        isotopes.iter().map(|isotope| isotope.mass).sum::<f64>() / isotopes.len() as f64
    }

    /// Mass of the most abundant isotope (the lightest one wins a tie)
    pub fn monoisotopic_mass(&self) -> f64 {
        let mut isotopes = self.isotopes().iter();
        let Some(mut most_abundant) = isotopes.next() else {
            return 0.0;
        };
        for isotope in isotopes {
            if isotope.abundance > most_abundant.abundance {
                most_abundant = isotope;
            }
        }
        most_abundant.mass
    }

    /// Abundance-weighted variance of the isotope masses around the average mass
    pub fn variance(&self) -> f64 {
        let average = self.average_mass();
        let mut variance = 0.0;
        let mut total_abundance = 0.0;
        for isotope in self.isotopes() {
            let difference = isotope.mass - average;
            variance += difference * difference * isotope.abundance;
            total_abundance += isotope.abundance;
        }
        if total_abundance == 0.0 {
            return 0.0;
        }
        variance / total_abundance
    }

    /// Abundances must be non-negative and total either 0 (no natural occurrence data)
    /// or 100 %. Unknown-mass elements are always valid.
    pub fn is_abundance_valid(&self) -> bool {
        if self.is_unknown() {
            return true;
        }
        let mut total_abundance = 0.0;
        for isotope in self.isotopes() {
            if isotope.abundance < 0.0 {
                return false;
            }
            total_abundance += isotope.abundance;
        }
        total_abundance == 0.0 || (total_abundance - 100.0).abs() <= ABUNDANCE_TOLERANCE
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Element {}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        self.atomic_number()
            .cmp(&other.atomic_number())
            .then_with(|| match (self, other) {
                (Element::UnknownMass(a), Element::UnknownMass(b)) => a.mass.total_cmp(&b.mass),
                (Element::UnknownMass(_), Element::Known(_)) => Ordering::Less,
                (Element::Known(_), Element::UnknownMass(_)) => Ordering::Greater,
                (Element::Known(_), Element::Known(_)) => Ordering::Equal,
            })
    }
}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.atomic_number().hash(state);
        if let Element::UnknownMass(isotope) = self {
            isotope.mass.to_bits().hash(state);
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
