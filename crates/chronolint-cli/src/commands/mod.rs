pub mod config;
pub mod graph;
pub mod lint;
pub mod plan;
pub mod task;

use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};

use chronolint_core::GraphError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read a JSON document from `path`, or stdin when absent or `-`.
pub fn read_json<T: DeserializeOwned>(path: Option<&PathBuf>) -> Result<T, Box<dyn Error>> {
    let raw = match path {
        Some(p) if p.as_path() != Path::new("-") => std::fs::read_to_string(p)
            .map_err(|e| format!("cannot read {}: {e}", p.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a graph failure as a JSON error object and exit non-zero.
pub fn exit_with_graph_error(err: &GraphError) -> ! {
    let body = serde_json::json!({
        "error": {
            "reason_code": err.reason_code().map(|code| code.as_str()),
            "message": err.to_string(),
        }
    });
    println!("{body}");
    std::process::exit(1);
}
