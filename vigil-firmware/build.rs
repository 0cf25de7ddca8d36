//! Build script for vigil-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml and turns it into compile-time constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Accepted baud rates for the inter-node link
const BAUDRATES: [i64; 5] = [57_600, 115_200, 250_000, 500_000, 1_000_000];

fn main() {
    setup_linker();
    let node = validate_config();
    generate_config(&node);
}

/// Validated node settings
struct NodeConfig {
    role: String,
    baudrate: i64,
    tick_hz: i64,
    probe_ticks: i64,
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml at compile time
fn validate_config() -> NodeConfig {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a node.toml configuration file.           ║\n\
            ║  Please create one in the vigil-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let node = read_node(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid node configuration                               ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=node.toml validated successfully ({} node)", node.role);
    node
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Look up `section.key`
fn lookup<'a>(config: &'a toml::Value, section: &str, key: &str) -> Option<&'a toml::Value> {
    config.get(section).and_then(|s| s.get(key))
}

/// Read an integer field, recording an error if missing or out of range
fn read_int(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match lookup(config, section, key) {
        Some(toml::Value::Integer(v)) if range.contains(v) => *v,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            ));
            *range.start()
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            *range.start()
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            *range.start()
        }
    }
}

fn read_node(config: &toml::Value, errors: &mut Vec<String>) -> NodeConfig {
    for section in ["node", "link", "timing"] {
        if !matches!(config.get(section), Some(toml::Value::Table(_))) {
            errors.push(format!("Missing [{}] section", section));
        }
    }

    let role = match lookup(config, "node", "role") {
        Some(toml::Value::String(role)) if role == "backend" || role == "frontend" => role.clone(),
        Some(_) => {
            errors.push("[node] role must be 'backend' or 'frontend'".to_string());
            String::from("backend")
        }
        None => {
            errors.push("[node] missing 'role'".to_string());
            String::from("backend")
        }
    };

    let baudrate = read_int(config, "link", "baudrate", 1..=1_000_000, errors);
    if !BAUDRATES.contains(&baudrate) {
        errors.push(format!("[link] baudrate {} is not supported", baudrate));
    }

    let tick_hz = read_int(config, "timing", "tick_hz", 1..=1000, errors);
    let probe_ticks = read_int(config, "timing", "probe_ticks", 1..=255, errors);

    NodeConfig {
        role,
        baudrate,
        tick_hz,
        probe_ticks,
    }
}

/// Write the validated settings as Rust constants into OUT_DIR
fn generate_config(node: &NodeConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let role = match node.role.as_str() {
        "frontend" => "Role::Frontend",
        _ => "Role::Backend",
    };

    let generated = format!(
        "// Generated from node.toml by build.rs\n\
         pub const ROLE: Role = {};\n\
         pub const BAUDRATE: u32 = {};\n\
         pub const TICK_HZ: u64 = {};\n\
         pub const PROBE_TICKS: u8 = {};\n",
        role, node.baudrate, node.tick_hz, node.probe_ticks
    );

    let mut f = File::create(out_dir.join("node_config.rs")).unwrap();
    f.write_all(generated.as_bytes()).unwrap();
}
