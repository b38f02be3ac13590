use serde_json::Value;

/// Pretty-printed JSON, the default format. The full envelope goes out
/// as-is so downstream tooling sees methodology and warnings too.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to serialise output: {}", e),
    }
}
