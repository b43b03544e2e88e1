use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for the risk-level fields first, then fall back to the
/// first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // The prediction block carries the headline answer for an analysis
    if let Some(prediction) = result_obj.get("prediction") {
        if let (Some(tier), Some(probability)) = (
            prediction.get("risk_tier"),
            prediction.get("probability"),
        ) {
            println!(
                "{} ({})",
                format_minimal(tier),
                format_minimal(probability)
            );
            return;
        }
    }

    let priority_keys = ["risk_tier", "probability", "value"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
