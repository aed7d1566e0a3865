/// elements, their isotopes and element categories
pub mod element;
/// ordered collection of elements loaded from JSON, with a bundled reference table
/// # Examples
/// ```
/// use ChemFormula::Chemistry::periodic_table::PeriodicTable;
/// let table = PeriodicTable::bundled().unwrap();
/// let iron = table.by_symbol("Fe").unwrap();
/// assert_eq!(iron.atomic_number(), 26);
/// assert_eq!(table.by_name("iron"), Some(iron));
/// ```
pub mod periodic_table;
/// immutable element/isotope multiset with a charge: merging, scaling, masses, rendering
/// # Examples
/// ```
/// use ChemFormula::Chemistry::composition::ChemicalComposition;
/// use ChemFormula::Chemistry::periodic_table::PeriodicTable;
/// let table = PeriodicTable::bundled().unwrap();
/// let hydrogen = table.by_symbol("H").unwrap();
/// let oxygen = table.by_symbol("O").unwrap();
/// let water = ChemicalComposition::new()
///     .with_element_count(hydrogen, 2)
///     .with_element(oxygen);
/// assert_eq!(water.to_string(), "H2O");
/// let ice = water.with_multiplied_counts(6).unwrap();
/// assert_eq!(ice.element_count(hydrogen), 12);
/// ```
pub mod composition;
pub(crate) mod symbol_matching;
/// free-form formula text to composition
/// # Examples
/// ```
/// use ChemFormula::Chemistry::formula_parser::ChemicalFormulaParser;
/// use ChemFormula::Chemistry::periodic_table::PeriodicTable;
/// let parser = ChemicalFormulaParser::new(&PeriodicTable::bundled().unwrap());
/// let sulfate = parser.parse("(NH4)2SO4").unwrap();
/// assert_eq!(sulfate.to_string(), "H8N2O4S");
/// let ion = parser.parse("SO4^2-").unwrap();
/// assert_eq!(ion.charge(), -2);
/// let (_, warnings) = parser.parse_collecting("h2o").unwrap();
/// assert_eq!(warnings.len(), 2);
/// ```
pub mod formula_parser;
/// isotope patterns: abundance convolution over a composition with peak merging
/// # Examples
/// ```
/// use ChemFormula::Chemistry::formula_parser::ChemicalFormulaParser;
/// use ChemFormula::Chemistry::isotope_distribution::IsotopeDistribution;
/// use ChemFormula::Chemistry::periodic_table::PeriodicTable;
/// let parser = ChemicalFormulaParser::new(&PeriodicTable::bundled().unwrap());
/// let chlorine = parser.parse("Cl2").unwrap();
/// let pattern = IsotopeDistribution::for_composition(&chlorine).unwrap();
/// assert_eq!(pattern.len(), 3);
/// assert_eq!(pattern.largest_abundance().unwrap().abundance, 1.0);
/// ```
pub mod isotope_distribution;
/// named substances
pub mod chemical;
/// molar masses, element composition matrices and summary tables for lists of formulas
pub mod molmass;

mod formula_parser_tests;
