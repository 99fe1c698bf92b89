//! Tool command handlers.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use cogmesh::ToolDispatcher;
use cogmesh::config::CogmeshConfig;
use cogmesh::mcp::{ToolContent, ToolResult};
use serde::Deserialize;
use serde_json::Value;

/// One line of a `run` batch.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchCall {
    tool: String,
    #[serde(default)]
    arguments: Value,
}

fn print_result(result: &ToolResult) {
    for ToolContent::Text { text } in &result.content {
        if result.is_error {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }
}

/// Tools command.
pub fn cmd_tools(config: &CogmeshConfig, json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let dispatcher = ToolDispatcher::new(config);
    let tools = dispatcher.registry().list_tools();
    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(ExitCode::SUCCESS);
    }
    let width = tools.iter().map(|tool| tool.name.len()).max().unwrap_or(0);
    for tool in tools {
        println!("{:<width$}  {}", tool.name, tool.description);
    }
    Ok(ExitCode::SUCCESS)
}

/// Presets command.
pub fn cmd_presets(config: &CogmeshConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut dispatcher = ToolDispatcher::new(config);
    let presets = dispatcher.dispatch("strategy.presets", Value::Null)?;
    print_result(&presets);
    Ok(ExitCode::SUCCESS)
}

/// Call command.
pub fn cmd_call(
    config: &CogmeshConfig,
    tool: &str,
    args: &str,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let arguments: Value = serde_json::from_str(args)?;
    let mut dispatcher = ToolDispatcher::new(config);
    let result = dispatcher.call(tool, arguments);
    print_result(&result);
    Ok(if result.is_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Run command.
///
/// Blank lines and lines starting with `#` are skipped. Every call runs even
/// after a failure; the exit code reports whether any failed.
pub fn cmd_run(config: &CogmeshConfig, file: Option<PathBuf>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let reader: Box<dyn BufRead> = match file {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut dispatcher = ToolDispatcher::new(config);
    let mut failures = 0_usize;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let result = match serde_json::from_str::<BatchCall>(trimmed) {
            Ok(call) => dispatcher.call(&call.tool, call.arguments),
            Err(e) => ToolResult::error(format!("line {}: {e}", number + 1)),
        };
        if result.is_error {
            failures += 1;
        }
        print_result(&result);
    }

    if failures > 0 {
        eprintln!("{failures} call(s) failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
