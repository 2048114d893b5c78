//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use pfxbrick::protocol::{BrickState, BrickStatus, IcdRevision};
use pfxbrick::{BrickDeviceInfo, FileDir, LutEntry};
use pfxbrick_profile::{CompileReport, StepStatus};
use serde::Serialize;
use serde_json::json;

use crate::error::exit_code;

/// Print `value` under `key` in a `{"success": true, ...}` envelope.
pub fn print_json<T: Serialize>(key: &str, value: &T) {
    let output = json!({
        "success": true,
        key: value,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format {} as JSON: {}", key, e),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "causes": causes,
            "exit_code": exit_code(error),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format error as JSON: {}", e),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

pub fn print_device_list(devices: &[BrickDeviceInfo], json: bool) {
    if json {
        print_json("devices", &devices);
        return;
    }
    if devices.is_empty() {
        println!("{}", "No PFx Bricks found".yellow());
        return;
    }
    println!("{}", "Connected PFx Bricks:".bold());
    for device in devices {
        println!("  {} {} ({})", "●".green(), device.display_name().bold(), device.path.dimmed());
    }
}

#[derive(Serialize)]
struct BrickInfo<'a> {
    status: &'a BrickStatus,
    icd: &'a IcdRevision,
    name: &'a str,
}

pub fn print_info(status: &BrickStatus, icd: &IcdRevision, name: &str, json: bool) {
    if json {
        print_json("brick", &BrickInfo { status, icd, name });
        return;
    }
    println!("{}", status);
    println!("ICD revision          : {}", icd);
    println!("Brick name            : {}", name.cyan());
}

pub fn print_file_dir(dir: &FileDir, json: bool) {
    if json {
        print_json("directory", dir);
    } else {
        println!("{}", dir);
    }
}

/// Print LUT rows; `all` includes empty actions.
pub fn print_lut(entries: &[LutEntry], all: bool, json: bool) {
    let rows: Vec<&LutEntry> = entries
        .iter()
        .filter(|e| all || !e.action.is_empty())
        .collect();
    if json {
        print_json("events", &rows);
        return;
    }
    if rows.is_empty() {
        println!("{}", "No actions configured".yellow());
        return;
    }
    for row in rows {
        println!("{}", row);
    }
}

pub fn print_state(state: &BrickState, json: bool) {
    if json {
        // One line per sample so the stream stays parseable.
        match serde_json::to_string(&json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "state": state,
        })) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to format state as JSON: {}", e),
        }
    } else {
        println!(
            "{}",
            chrono::Local::now().format("%H:%M:%S").to_string().dimmed()
        );
        println!("{}", state);
    }
}

pub fn print_report(report: &CompileReport, json: bool) {
    if json {
        print_json("report", report);
        return;
    }
    for step in &report.steps {
        match &step.status {
            StepStatus::Ok => println!("  {} {}", "✓".green(), step.label),
            StepStatus::Skipped(why) => {
                println!("  {} {} {}", "-".dimmed(), step.label, format!("({why})").dimmed())
            }
            StepStatus::Failed(why) => println!("  {} {}: {}", "✗".red(), step.label, why.red()),
        }
    }
    let failed = report.failures().count();
    let summary = format!(
        "{} steps, {} ok, {} failed",
        report.steps.len(),
        report.count_ok(),
        failed
    );
    if failed == 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
}

/// Print success message
pub fn print_success(message: &str, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "message": message
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to format success message as JSON: {}", e),
        }
    } else {
        println!("{} {}", "✓".green(), message);
    }
}

/// Print warning message
pub fn print_warning(message: &str, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "warning": message
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to format warning message as JSON: {}", e),
        }
    } else {
        println!("{} {}", "⚠".yellow(), message);
    }
}
