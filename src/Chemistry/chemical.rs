use crate::Chemistry::composition::ChemicalComposition;
use crate::Chemistry::formula_parser::{ChemicalFormulaParser, FormulaError};

/// A named substance and its composition
#[derive(Debug, Clone, PartialEq)]
pub struct Chemical {
    pub name: String,
    pub alternative_names: Vec<String>,
    pub composition: ChemicalComposition,
}

impl Chemical {
    pub fn new(name: &str, composition: ChemicalComposition) -> Self {
        Self {
            name: name.to_string(),
            alternative_names: Vec::new(),
            composition,
        }
    }

    pub fn from_formula(
        name: &str,
        formula: &str,
        parser: &ChemicalFormulaParser,
    ) -> Result<Self, FormulaError> {
        Ok(Self::new(name, parser.parse(formula)?))
    }

    pub fn with_alternative_name(mut self, name: &str) -> Self {
        self.alternative_names.push(name.to_string());
        self
    }

    /// true if `name` is the name or one of the alternative names, ignoring case
    pub fn is_called(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .alternative_names
                .iter()
                .any(|alternative| alternative.eq_ignore_ascii_case(name))
    }

    pub fn formula(&self) -> String {
        self.composition.to_string()
    }

    pub fn average_mass(&self) -> f64 {
        self.composition.average_mass()
    }

    pub fn monoisotopic_mass(&self) -> f64 {
        self.composition.monoisotopic_mass()
    }
}
