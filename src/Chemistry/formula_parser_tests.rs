#[cfg(test)]
mod tests {
    use crate::Chemistry::composition::ChemicalComposition;
    use crate::Chemistry::element::{Category, Element};
    use crate::Chemistry::formula_parser::{ChemicalFormulaParser, FormulaError, FormulaWarning};
    use crate::Chemistry::periodic_table::PeriodicTable;
    use approx::assert_relative_eq;

    fn setup() -> (PeriodicTable, ChemicalFormulaParser) {
        let table = PeriodicTable::bundled().unwrap();
        let parser = ChemicalFormulaParser::new(&table);
        (table, parser)
    }

    fn element<'a>(table: &'a PeriodicTable, symbol: &str) -> &'a Element {
        table.by_symbol(symbol).unwrap()
    }

    /// element counts by symbol, isotopes as "^13C"
    fn counts(composition: &ChemicalComposition) -> Vec<(String, u32)> {
        let mut counts: Vec<(String, u32)> = composition
            .element_counts()
            .iter()
            .map(|(element, &count)| (element.symbol().to_string(), count))
            .collect();
        counts.extend(
            composition
                .isotope_counts()
                .iter()
                .map(|(isotope, &count)| (isotope.to_string(), count)),
        );
        counts
    }

    fn expected(list: &[(&str, u32)]) -> Vec<(String, u32)> {
        list.iter()
            .map(|(symbol, count)| (symbol.to_string(), *count))
            .collect()
    }

    #[test]
    fn test_simple_formula() {
        let (table, parser) = setup();
        let (water, warnings) = parser.parse_collecting("H2O").unwrap();
        assert!(warnings.is_empty());
        assert_eq!(water.element_count(element(&table, "H")), 2);
        assert_eq!(water.element_count(element(&table, "O")), 1);
        assert!(water.isotope_counts().is_empty());
        assert_eq!(water.charge(), 1);
        assert_relative_eq!(water.average_mass(), 18.015, epsilon = 1e-3);
    }

    #[test]
    fn test_groups_and_counts() {
        let (_, parser) = setup();
        let sulfate = parser.parse("(NH4)2SO4").unwrap();
        assert_eq!(
            counts(&sulfate),
            expected(&[("H", 8), ("N", 2), ("O", 4), ("S", 1)])
        );
        let acetic = parser.parse("CH3COOH").unwrap();
        assert_eq!(counts(&acetic), expected(&[("H", 4), ("C", 2), ("O", 2)]));
        let nested = parser.parse("[Co(NH3)6]Cl3").unwrap();
        assert_eq!(
            counts(&nested),
            expected(&[("H", 18), ("N", 6), ("Cl", 3), ("Co", 1)])
        );
        // a zero suffix drops the group
        let dropped = parser.parse("(NH4)0Cl").unwrap();
        assert_eq!(counts(&dropped), expected(&[("Cl", 1)]));
    }

    #[test]
    fn test_charges() {
        let (table, parser) = setup();
        // "Na+" agrees with an explicit +1 and a neutral "Na^0+" does not
        let sodium = parser.parse("Na+").unwrap();
        let explicit = ChemicalComposition::new()
            .with_element(element(&table, "Na"))
            .with_charge(1);
        assert_eq!(sodium.charge(), explicit.charge());
        assert_eq!(sodium, explicit);
        assert_eq!(parser.parse("Na^0+").unwrap().charge(), 0);
        assert_eq!(parser.parse("K-").unwrap().charge(), -1);
        assert_eq!(parser.parse("Cl-").unwrap().charge(), -1);
        assert_eq!(parser.parse("O^-").unwrap().charge(), -1);
        assert_eq!(parser.parse("Fe^3+").unwrap().charge(), 3);

        let sulfate = parser.parse("SO4^2-").unwrap();
        assert_eq!(sulfate.charge(), -2);
        assert_eq!(counts(&sulfate), expected(&[("O", 4), ("S", 1)]));
        assert_relative_eq!(
            sulfate.average_mass_at_charge(sulfate.charge()),
            96.0624 / 2.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_charge_magnitude_before_caret() {
        let (table, parser) = setup();
        let (calcium, warnings) = parser.parse_collecting("Ca 2^+").unwrap();
        assert_eq!(calcium.charge(), 2);
        assert_eq!(calcium.element_count(element(&table, "Ca")), 1);
        assert_eq!(warnings, vec![FormulaWarning::IgnoredWhitespace]);

        let bare = parser.parse("13^-").unwrap();
        assert_eq!(bare.charge(), -13);
        assert!(bare.is_empty());

        // a caret after a pending specifier still needs a sign to follow
        assert!(matches!(
            parser.parse("13^C"),
            Err(FormulaError::UnexpectedCharacter { character: '^', .. })
        ));
    }

    #[test]
    fn test_count_overflow() {
        let (table, parser) = setup();
        let hydrogen = element(&table, "H");
        for formula in ["H4294967295H", "HH4294967295", "(H4294967295)H", "HH{4294967295}"] {
            assert!(
                matches!(
                    parser.parse(formula),
                    Err(FormulaError::CountOverflow { .. })
                ),
                "{} should overflow",
                formula
            );
        }
        let full = parser.parse("H4294967295").unwrap();
        assert_eq!(full.element_count(hydrogen), u32::MAX);

        // isotope totals are widened rather than wrapped
        let carbon = element(&table, "C");
        let labelled = parser.parse("^12C4294967295^13C").unwrap();
        assert_eq!(labelled.isotope_of_count(carbon), 4_294_967_296);
        assert_eq!(labelled.element_or_isotope_of_count(carbon), 4_294_967_296);
    }

    #[test]
    fn test_isotopes() {
        let (table, parser) = setup();
        let carbon = element(&table, "C");
        let c13 = carbon.isotope(13).unwrap();

        let labelled = parser.parse("^13C").unwrap();
        assert!(labelled.element_counts().is_empty());
        assert_eq!(labelled.isotope_count(c13), 1);

        // a specifier applies to the first element of the run, a count to the last
        let dioxide = parser.parse("13CO2").unwrap();
        assert_eq!(counts(&dioxide), expected(&[("O", 2), ("^13C", 1)]));

        let grouped = parser.parse("(12C)O2").unwrap();
        assert_eq!(counts(&grouped), expected(&[("O", 2), ("^12C", 1)]));

        let methane = parser.parse("^13CH4").unwrap();
        assert_eq!(counts(&methane), expected(&[("H", 4), ("^13C", 1)]));

        let deuterated = parser.parse("^2H2O").unwrap();
        assert_eq!(counts(&deuterated), expected(&[("O", 1), ("^2H", 2)]));
    }

    #[test]
    fn test_unknown_mass_element() {
        let (_, parser) = setup();
        let composition = parser.parse("?12.345").unwrap();
        assert_eq!(composition.element_counts().len(), 1);
        let (unknown, &count) = composition.element_counts().iter().next().unwrap();
        assert!(unknown.is_unknown());
        assert_eq!(count, 1);
        assert_relative_eq!(unknown.average_mass(), 12.345, epsilon = 1e-12);

        let mixed = parser.parse("?100H2").unwrap();
        assert_relative_eq!(mixed.average_mass(), 100.0 + 2.0 * 1.00794, epsilon = 1e-3);
    }

    #[test]
    fn test_empty_formula() {
        let (_, parser) = setup();
        let (composition, warnings) = parser.parse_collecting("").unwrap();
        assert!(composition.is_empty());
        assert_eq!(warnings, vec![FormulaWarning::EmptyFormula]);
    }

    #[test]
    fn test_braced_count() {
        let (_, parser) = setup();
        let composition = parser.parse("Fe{2}(SO4)3^2-").unwrap();
        assert_eq!(
            counts(&composition),
            expected(&[("O", 12), ("S", 3), ("Fe", 2)])
        );
        assert_eq!(composition.charge(), -2);

        let grouped = parser.parse("(H{2})3").unwrap();
        assert_eq!(counts(&grouped), expected(&[("H", 6)]));

        // nothing precedes the bracket
        assert!(matches!(
            parser.parse("{2}"),
            Err(FormulaError::UnexpectedCharacter { character: '}', .. })
        ));
    }

    #[test]
    fn test_capitalisation_warnings() {
        let (table, parser) = setup();
        let (water, warnings) = parser.parse_collecting("h2o").unwrap();
        assert_eq!(water.element_count(element(&table, "H")), 2);
        assert_eq!(
            warnings,
            vec![
                FormulaWarning::InvalidCapitalisation {
                    symbol: "H".to_string(),
                    formula: "h2o".to_string()
                },
                FormulaWarning::InvalidCapitalisation {
                    symbol: "O".to_string(),
                    formula: "h2o".to_string()
                },
            ]
        );

        let (salt, warnings) = parser.parse_collecting("NACl").unwrap();
        assert_eq!(counts(&salt), expected(&[("Na", 1), ("Cl", 1)]));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            FormulaWarning::InvalidCapitalisation { symbol, .. } if symbol == "Na"
        ));
    }

    #[test]
    fn test_ignored_characters_reported_once() {
        let (_, parser) = setup();
        let (composition, warnings) = parser.parse_collecting("H2 O  H").unwrap();
        assert_eq!(counts(&composition), expected(&[("H", 3), ("O", 1)]));
        assert_eq!(warnings, vec![FormulaWarning::IgnoredWhitespace]);

        let (ethane, warnings) = parser.parse_collecting("CH3-CH3").unwrap();
        assert_eq!(counts(&ethane), expected(&[("H", 6), ("C", 2)]));
        assert_eq!(
            warnings,
            vec![FormulaWarning::IgnoredCharacter { character: '-' }]
        );

        // a number after a dot is an isotope specifier, not a hydrate count
        assert!(matches!(
            parser.parse("CuSO4.5H2O"),
            Err(FormulaError::UnknownIsotope { mass_number: 5, .. })
        ));
    }

    #[test]
    fn test_bracket_warnings() {
        let (_, parser) = setup();
        let (composition, warnings) = parser.parse_collecting("(NH4]2").unwrap();
        assert_eq!(counts(&composition), expected(&[("H", 8), ("N", 2)]));
        assert_eq!(
            warnings,
            vec![FormulaWarning::MismatchedBrackets {
                opening: '(',
                closing: ']',
                formula: "(NH4]2".to_string()
            }]
        );

        let (composition, warnings) = parser.parse_collecting("((NH4").unwrap();
        assert_eq!(counts(&composition), expected(&[("H", 4), ("N", 1)]));
        assert_eq!(warnings.len(), 2);
        assert!(
            warnings
                .iter()
                .all(|w| matches!(w, FormulaWarning::UnclosedBracket { .. }))
        );
    }

    #[test]
    fn test_structural_errors() {
        let (_, parser) = setup();
        assert_eq!(
            parser.parse("H2O)"),
            Err(FormulaError::BracketUnderflow {
                character: ')',
                formula: "H2O)".to_string()
            })
        );
        assert_eq!(
            parser.parse("Na+Cl"),
            Err(FormulaError::TrailingAfterCharge {
                character: 'C',
                formula: "Na+Cl".to_string()
            })
        );
        assert!(matches!(
            parser.parse("H2O!"),
            Err(FormulaError::UnexpectedCharacter { character: '!', .. })
        ));
        // isotopes apply to single elements only
        assert!(matches!(
            parser.parse("^13(C)"),
            Err(FormulaError::UnexpectedCharacter { character: '(', .. })
        ));
        // a second specifier before the element
        assert!(matches!(
            parser.parse("^13^2C"),
            Err(FormulaError::UnexpectedCharacter { character: '^', .. })
        ));
        assert!(matches!(
            parser.parse("C13^"),
            Err(FormulaError::UnexpectedCharacter { character: '^', .. })
        ));
    }

    #[test]
    fn test_unexpected_end() {
        let (_, parser) = setup();
        assert_eq!(
            parser.parse("H^2"),
            Err(FormulaError::UnexpectedEnd {
                specifier: 2,
                formula: "H^2".to_string()
            })
        );
        assert!(matches!(
            parser.parse("13"),
            Err(FormulaError::UnexpectedEnd { specifier: 13, .. })
        ));
    }

    #[test]
    fn test_symbol_and_isotope_errors() {
        let (_, parser) = setup();
        let error = parser.parse("Xq").unwrap_err();
        assert_eq!(
            error,
            FormulaError::UnmatchedSymbols {
                letters: "Xq".to_string(),
                formula: "Xq".to_string()
            }
        );
        assert_eq!(
            error.to_string(),
            "Symbols \"Xq\" cannot be matched in \"Xq\"."
        );

        assert_eq!(
            parser.parse("^99C"),
            Err(FormulaError::UnknownIsotope {
                element: "Carbon".to_string(),
                mass_number: 99,
                formula: "^99C".to_string()
            })
        );
        assert!(matches!(
            parser.parse("H99999999999"),
            Err(FormulaError::NumberOverflow { .. })
        ));
    }

    #[test]
    fn test_unknown_mass_errors() {
        let (_, parser) = setup();
        assert_eq!(
            parser.parse("?."),
            Err(FormulaError::MalformedUnknownMass {
                text: ".".to_string(),
                formula: "?.".to_string()
            })
        );
        assert!(matches!(
            parser.parse("?"),
            Err(FormulaError::UnexpectedCharacter { character: '?', .. })
        ));
        assert!(matches!(
            parser.parse("?x"),
            Err(FormulaError::UnexpectedCharacter { character: 'x', .. })
        ));
    }

    #[test]
    fn test_display_string_parses_back() {
        let (_, parser) = setup();
        for formula in [
            "(NH4)2SO4",
            "CH3COOH",
            "13CO2",
            "Fe{2}(SO4)3",
            "^2H2^13CCl4",
            "[Co(NH3)6]Cl3",
        ] {
            let composition = parser.parse(formula).unwrap();
            let reparsed = parser.parse(&composition.to_string()).unwrap();
            assert_eq!(reparsed, composition, "{}", formula);
            assert_eq!(counts(&reparsed), counts(&composition));
        }
    }

    #[test]
    fn test_parse_with_callback() {
        let (_, parser) = setup();
        let mut reported = 0;
        let composition = parser.parse_with("h2o co", |_| reported += 1).unwrap();
        assert_eq!(reported, 4);
        assert_eq!(
            counts(&composition),
            expected(&[("H", 2), ("O", 1), ("Co", 1)])
        );
    }

    #[test]
    fn test_custom_element_collection() {
        let exotic = Element::new(
            200,
            "Exoticium",
            "Xy",
            Category::None,
            &[(400, 400.0, 100.0)],
        );
        let parser = ChemicalFormulaParser::from_elements(vec![exotic.clone()]);
        assert_eq!(parser.elements().len(), 1);
        let composition = parser.parse("Xy2").unwrap();
        assert_eq!(composition.element_count(&exotic), 2);
        assert_relative_eq!(composition.average_mass(), 800.0, epsilon = 1e-12);
        assert!(parser.parse("H2O").is_err());
    }

    #[test]
    fn test_parser_shared_between_threads() {
        let (_, parser) = setup();
        let formulas = ["H2O", "(NH4)2SO4", "Ca(NO3)2", "SO4^2-"];
        let atoms: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = formulas
                .iter()
                .map(|formula| {
                    let parser = &parser;
                    scope.spawn(move || parser.parse(formula).unwrap().atom_count())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(atoms, vec![3, 15, 9, 5]);
    }
}
