use super::{ValidateCommands, ValidateFileArgs};
use anyhow::{Context, Result};
use guildprompt_core::template;
use guildprompt_core::{SchemaValidator, ValidationResult};
use std::path::Path;

pub fn run(cmd: ValidateCommands) -> Result<()> {
    let validator = SchemaValidator::default();
    match cmd {
        ValidateCommands::Routing(args) => {
            let text = read(&args.file)?;
            report(&args, &validator.validate_routing_file(&text), &[])
        }
        ValidateCommands::Template(args) => {
            let text = read(&args.file)?;
            let placeholders = template::placeholders(&text);
            report(&args, &validator.validate_prompt(&text), &placeholders)
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn report(args: &ValidateFileArgs, result: &ValidationResult, placeholders: &[String]) -> Result<()> {
    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(result)?),
        _ => {
            if result.is_valid {
                println!("✅ {} is valid.", args.file.display());
            } else {
                println!("❌ Validation errors in {}:", args.file.display());
                for e in &result.errors {
                    println!("  - {}", e);
                }
            }
            for w in &result.warnings {
                println!("  ⚠ {}", w);
            }
            if !placeholders.is_empty() {
                println!("Placeholders: {}", placeholders.join(", "));
            }
        }
    }

    if !result.is_valid {
        std::process::exit(1);
    }
    Ok(())
}
