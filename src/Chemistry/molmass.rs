//! Module to calculate the atomic composition and molar mass of chemical formulas
use crate::Chemistry::composition::ChemicalComposition;
use crate::Chemistry::element::Element;
use crate::Chemistry::formula_parser::{ChemicalFormulaParser, FormulaError};
use log::info;
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use std::collections::BTreeMap;

// Function to calculate the molar mass of a substance given its chemical formula
pub fn calculate_molar_mass(
    parser: &ChemicalFormulaParser,
    formula: &str,
) -> Result<(f64, ChemicalComposition), FormulaError> {
    let composition = parser.parse(formula)?;
    let molar_mass = composition.average_mass_at_charge(0);
    Ok((molar_mass, composition))
}

// Function to calculate the molar mass of a vector of chemical formulas
pub fn calculate_molar_mass_of_vector_of_subs(
    parser: &ChemicalFormulaParser,
    vec_of_formulae: &[&str],
) -> Result<Vec<f64>, FormulaError> {
    info!("calculating molar masses of {} substances", vec_of_formulae.len());
    vec_of_formulae
        .iter()
        .map(|formula| calculate_molar_mass(parser, formula).map(|(molar_mass, _)| molar_mass))
        .collect()
}

/// Column key of an element: unknown-mass elements all share atomic number 0 and
/// symbol `Uk`, so they are told apart by their mass (`?12.5`).
fn column_key(element: &Element) -> (u32, String) {
    if element.is_unknown() {
        (0, format!("?{}", element.monoisotopic_mass()))
    } else {
        (element.atomic_number(), element.symbol().to_string())
    }
}

/// Matrix of atom counts: one row per formula, one column per element. Isotope counts
/// are added to the column of their element. Columns are ordered by atomic number and
/// their symbols are returned alongside the matrix. Each distinct unknown mass gets a
/// column of its own.
pub fn create_elem_composition_matrix(
    parser: &ChemicalFormulaParser,
    vec_of_formulae: &[&str],
) -> Result<(DMatrix<f64>, Vec<String>), FormulaError> {
    let mut columns: BTreeMap<(u32, String), usize> = BTreeMap::new();
    let mut vec_of_counts = Vec::new();
    for formula in vec_of_formulae {
        let composition = parser.parse(formula)?;
        let mut counts: BTreeMap<(u32, String), u64> = BTreeMap::new();
        for (element, &count) in composition.element_counts() {
            *counts.entry(column_key(element)).or_insert(0) += u64::from(count);
        }
        for (isotope, &count) in composition.isotope_counts() {
            let key = if isotope.atomic_number() == 0 {
                (0, format!("?{}", isotope.mass()))
            } else {
                (isotope.atomic_number(), isotope.symbol().to_string())
            };
            *counts.entry(key).or_insert(0) += u64::from(count);
        }
        for key in counts.keys() {
            columns.insert(key.clone(), 0);
        }
        vec_of_counts.push(counts);
    }
    for (j, column) in columns.values_mut().enumerate() {
        *column = j;
    }

    let mut matrix = DMatrix::zeros(vec_of_formulae.len(), columns.len());
    for (substance_i, counts) in vec_of_counts.iter().enumerate() {
        for (key, &count) in counts {
            if let Some(&j) = columns.get(key) {
                matrix[(substance_i, j)] += count as f64;
            }
        }
    }
    let symbols = columns.into_keys().map(|(_, symbol)| symbol).collect();
    Ok((matrix, symbols))
}

/// Summary table: formula, canonical formula, charge, average and monoisotopic mass
/// (both per unit charge)
pub fn composition_table(
    parser: &ChemicalFormulaParser,
    vec_of_formulae: &[&str],
) -> Result<Table, FormulaError> {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Formula"),
        Cell::new("Composition"),
        Cell::new("Charge"),
        Cell::new("Average mass"),
        Cell::new("Monoisotopic mass"),
    ]));
    for formula in vec_of_formulae {
        let composition = parser.parse(formula)?;
        let charge = composition.charge();
        table.add_row(Row::new(vec![
            Cell::new(formula),
            Cell::new(&composition.to_string()),
            Cell::new(&charge.to_string()),
            Cell::new(&format!("{:.5}", composition.average_mass_at_charge(charge))),
            Cell::new(&format!(
                "{:.5}",
                composition.monoisotopic_mass_at_charge(charge)
            )),
        ]));
    }
    Ok(table)
}
