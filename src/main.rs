use ChemFormula::Chemistry::formula_parser::ChemicalFormulaParser;
use ChemFormula::Chemistry::isotope_distribution::IsotopeDistribution;
use ChemFormula::Chemistry::molmass::composition_table;
use ChemFormula::logging::init_logging;
use ChemFormula::settings::ChemistrySettings;
use log::error;
use std::process::ExitCode;

const DEMO_FORMULAS: [&str; 8] = [
    "H2O",
    "CH3COOH",
    "(NH4)2SO4",
    "Fe{2}(SO4)3^2-",
    "^13CH4",
    "[Co(NH3)6]Cl3",
    "?127.5H2",
    "Na+",
];

pub fn main() -> ExitCode {
    let settings = ChemistrySettings::new();
    init_logging(settings.log_level());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let formulas: Vec<&str> = if args.is_empty() {
        DEMO_FORMULAS.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    let table = match settings.periodic_table() {
        Ok(table) => table,
        Err(e) => {
            error!("cannot load periodic table: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let parser = ChemicalFormulaParser::new(&table);

    // bad formulas are reported and left out of the table, warnings are logged by the table pass
    let mut valid = Vec::new();
    for formula in formulas {
        match parser.parse_with(formula, |_| {}) {
            Ok(_) => valid.push(formula),
            Err(e) => eprintln!("{}", e),
        }
    }

    match composition_table(&parser, &valid) {
        Ok(summary) => {
            summary.printstd();
            // a single formula also gets its isotope pattern
            if let [formula] = valid.as_slice() {
                let pattern = parser
                    .parse_with(formula, |_| {})
                    .map_err(|e| e.to_string())
                    .and_then(|composition| {
                        IsotopeDistribution::for_composition(&composition)
                            .map_err(|e| e.to_string())
                    });
                match pattern {
                    Ok(pattern) => {
                        pattern.to_table().printstd();
                    }
                    Err(e) => error!("{}", e),
                }
            }
            if valid.len() == args.len() || args.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
