use pvmodel::input::ModelInput;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(ModelInput);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
