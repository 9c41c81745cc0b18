//! Test harness for the HUML parser against fixture files.
//!
//! Every `.huml` file in `test/huml/` must parse, and its value must match the
//! JSON document of the same name in `test/json/`. Every `.huml` file in
//! `test/nay/` must fail with the message in the matching `.error` file.
//! Valid fixtures are also pushed through the encoder and parsed again.

use std::fs;
use std::path::{Path, PathBuf};

use libhuml::{encode, parse, Value};

/// Compare two Values, treating NaN as equal to NaN.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(a), Value::Float(b)) if a.is_nan() && b.is_nan() => true,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Dict(a), Value::Dict(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).map_or(false, |bv| values_equal(v, bv)))
        }
        _ => a == b,
    }
}

/// Convert to JSON for comparison with the expected documents. JSON has no
/// NaN or infinities, so those compare as their HUML spelling.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| {
                let spelling = if f.is_nan() {
                    "nan"
                } else if *f > 0.0 {
                    "inf"
                } else {
                    "-inf"
                };
                serde_json::Value::String(spelling.to_string())
            }),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Dict(dict) => serde_json::Value::Object(
            dict.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
    }
}

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All `.huml` files in a subdirectory of test/, sorted.
fn huml_files(subdir: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join("*.huml");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

/// Read a sibling fixture with the same stem from another directory.
fn read_companion(path: &Path, dir: &str, ext: &str) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    fs::read_to_string(test_root().join(dir).join(format!("{}.{}", stem, ext))).ok()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Run a single valid fixture.
fn run_huml_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    let value =
        parse(&content).map_err(|e| format!("{}: Unexpected parse error: {}", filename, e))?;

    match read_companion(path, "json", "json") {
        Some(expected) => {
            let expected: serde_json::Value = serde_json::from_str(&expected)
                .map_err(|e| format!("{}: Bad JSON fixture: {}", filename, e))?;
            let actual = to_json(&value);
            if actual != expected {
                return Err(format!(
                    "{}: Output mismatch\n    expected: {}\n    actual:   {}",
                    filename, expected, actual
                ));
            }
            println!("  {} => {}", filename, actual);
        }
        None => println!("  {} => {:?} (no expected output)", filename, value),
    }
    Ok(())
}

/// Run a single invalid fixture.
fn run_nay_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    let error = match parse(&content) {
        Ok(value) => {
            return Err(format!(
                "{}: Expected parse error, but got success: {:?}",
                filename, value
            ))
        }
        Err(e) => e.to_string(),
    };

    match read_companion(path, "nay", "error") {
        Some(expected) if expected.trim() == error => {
            println!("  {} => error (as expected)", filename);
            Ok(())
        }
        Some(expected) => Err(format!(
            "{}: Error mismatch\n    expected: {}\n    actual:   {}",
            filename,
            expected.trim(),
            error
        )),
        None => {
            println!("  {} => error: {} (no .error file to compare)", filename, error);
            Ok(())
        }
    }
}

/// Encode a valid fixture's value and parse it back.
fn run_round_trip(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;
    let value = parse(&content).map_err(|e| format!("{}: {}", filename, e))?;
    let text = encode(&value).map_err(|e| format!("{}: encode failed: {}", filename, e))?;
    let again = parse(&text)
        .map_err(|e| format!("{}: encoded output does not parse: {}\n{}", filename, e, text))?;
    if !values_equal(&value, &again) {
        return Err(format!(
            "{}: Round trip mismatch\n    before: {:?}\n    after:  {:?}",
            filename, value, again
        ));
    }
    Ok(())
}

fn run_all(kind: &str, files: &[PathBuf], run: fn(&Path) -> Result<(), String>) {
    assert!(!files.is_empty(), "No {} fixtures found!", kind);
    println!("\nRunning {} {} fixtures:", files.len(), kind);

    let errors: Vec<String> = files.iter().filter_map(|f| run(f).err()).collect();
    println!(
        "\nResults: {} passed, {} failed",
        files.len() - errors.len(),
        errors.len()
    );

    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }
    assert!(errors.is_empty(), "{} {} tests failed", errors.len(), kind);
}

#[test]
fn test_all_huml_fixtures() {
    run_all("valid", &huml_files("huml"), run_huml_test);
}

#[test]
fn test_all_nay_fixtures() {
    run_all("invalid", &huml_files("nay"), run_nay_test);
}

#[test]
fn test_all_fixtures_round_trip() {
    run_all("round-trip", &huml_files("huml"), run_round_trip);
}
