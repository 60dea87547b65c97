//! # SCIM Schema Validator
//!
//! A command-line utility that checks SCIM schema files (RFC 7643 §7 form)
//! by registering them into a fresh [`SchemaRegistry`], the same way an
//! application would at startup.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin schema-validator schemas/Device.json
//! cargo run --bin schema-validator ./schemas/
//! ```
//!
//! A directory is checked file by file in name order; every file is then
//! registered into one registry, which also catches schemas sharing a URN.
//!
//! ## Output Example
//!
//! ```text
//! Validating schemas in directory: ./schemas/
//!
//! Validating: Device.json
//!   ✓ Valid - Device (urn:example:params:scim:schemas:Device)
//!
//! Validation Summary:
//!   Valid schemas: 1
//!   Invalid schemas: 0
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: All schemas are valid
//! - `1`: One or more schemas are invalid or could not be read

use scim_models::schema::{AttributeType, Schema, SchemaRegistry};
use scim_models::ScimResult;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <schema-file-or-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} schemas/Device.json", args[0]);
        eprintln!("  {} ./schemas/", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);

    if path.is_file() {
        validate_single_file(path);
    } else if path.is_dir() {
        validate_directory(path);
    } else {
        eprintln!(
            "Error: '{}' is not a valid file or directory",
            path.display()
        );
        process::exit(1);
    }
}

fn validate_single_file(file_path: &Path) {
    println!("Validating schema file: {}", file_path.display());

    match load_and_register(file_path) {
        Ok(schema) => {
            println!("✓ Schema is valid!");
            print_schema_summary(&schema);
        }
        Err(e) => {
            eprintln!("❌ Schema validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn validate_directory(dir_path: &Path) {
    println!("Validating schemas in directory: {}", dir_path.display());

    let files = match json_files(dir_path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            process::exit(1);
        }
    };

    let mut valid_count = 0;
    let mut error_count = 0;
    for path in &files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\nValidating: {}", name);

        match load_and_register(path) {
            Ok(schema) => {
                println!("  ✓ Valid - {} ({})", schema.name, schema.id);
                valid_count += 1;
            }
            Err(e) => {
                eprintln!("  ❌ Invalid - {}", e);
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid schemas: {}", valid_count);
    println!("  Invalid schemas: {}", error_count);

    if error_count > 0 {
        process::exit(1);
    }

    println!("\nTesting schema registry loading...");
    match SchemaRegistry::from_schema_dir(dir_path) {
        Ok(registry) => {
            println!("✓ Schema registry loaded successfully");
            let schemas = registry.get_schemas();
            println!("  Total schemas loaded: {}", schemas.len());
            for schema in schemas {
                println!("    - {} ({})", schema.name, schema.id);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to load schema registry: {}", e);
            process::exit(1);
        }
    }
}

fn json_files(dir_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load one file and register it alone, running every definition check.
fn load_and_register(file_path: &Path) -> ScimResult<Schema> {
    let schema = SchemaRegistry::load_schema_from_file(file_path)?;
    let mut registry = SchemaRegistry::empty();
    registry.register(schema.clone())?;
    Ok(schema)
}

fn print_schema_summary(schema: &Schema) {
    println!();
    println!("Schema Summary:");
    println!("  ID: {}", schema.id);
    println!("  Name: {}", schema.name);
    println!("  Description: {}", schema.description);
    println!("  Attributes: {}", schema.attributes.len());

    let mut type_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut required_count = 0;
    let mut multi_valued_count = 0;
    let mut sub_attribute_count = 0;

    for attr in &schema.attributes {
        *type_counts.entry(attr.data_type.as_str()).or_insert(0) += 1;
        if attr.required {
            required_count += 1;
        }
        if attr.multi_valued {
            multi_valued_count += 1;
        }
        if attr.data_type == AttributeType::Complex {
            sub_attribute_count += attr.sub_attributes.len();
        }
    }

    println!("  Required attributes: {}", required_count);
    println!("  Multi-valued attributes: {}", multi_valued_count);
    println!("  Sub-attributes: {}", sub_attribute_count);
    println!("  Attribute types:");
    for (attr_type, count) in type_counts {
        println!("    - {}: {}", attr_type, count);
    }

    let required_attrs: Vec<&str> = schema
        .attributes
        .iter()
        .filter(|attr| attr.required)
        .map(|attr| attr.name.as_str())
        .collect();

    if !required_attrs.is_empty() {
        println!("  Required attribute names: {}", required_attrs.join(", "));
    }
}
