use pvmodel::input::ModelInput;
use schemars::schema_for;
use serde_json::{json, Value};
use std::fs::File;
use walkdir::WalkDir;

fn input_schema() -> Value {
    serde_json::to_value(schema_for!(ModelInput)).unwrap()
}

#[test]
fn test_generate_json_schema() {
    let schema = schema_for!(ModelInput);
    assert!(serde_json::to_string_pretty(&schema).is_ok());
}

#[test]
fn test_demo_inputs_conform_to_schema() {
    let validator = jsonschema::validator_for(&input_schema()).unwrap();

    for entry in WalkDir::new("../demos/input")
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir() && e.file_name().to_str().unwrap().ends_with("json"))
    {
        let instance: Value = serde_json::from_reader(File::open(entry.path()).unwrap()).unwrap();
        assert!(
            validator.is_valid(&instance),
            "{} does not match the input schema",
            entry.path().display()
        );
    }
}

#[test]
fn test_schema_rejects_unknown_sections() {
    let validator = jsonschema::validator_for(&input_schema()).unwrap();

    assert!(validator.is_valid(&json!({})));
    assert!(!validator.is_valid(&json!({ "weather": {} })));
    assert!(!validator.is_valid(&json!({ "temperature_correction": "quadratic" })));
}

#[test]
fn test_schema_lists_canonical_panel_names_only() {
    let validator = jsonschema::validator_for(&input_schema()).unwrap();
    let canonical = json!({
        "panel": { "short_circuit_current": 9.35, "open_circuit_voltage": 47.4, "cells_in_series": 72 }
    });
    let symbols = json!({ "panel": { "I_sc": 9.35, "V_oc": 47.4, "N_s": 72 } });

    assert!(validator.is_valid(&canonical));
    assert!(!validator.is_valid(&symbols));

    // the parser still takes the symbol keys
    let parsed: ModelInput = serde_json::from_value(symbols).unwrap();
    let expected: ModelInput = serde_json::from_value(canonical).unwrap();
    assert_eq!(parsed, expected);
}
