use super::RoutesArgs;
use anyhow::{Context, Result};
use guildprompt_core::RoutingFileParser;

pub fn run(args: RoutesArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let parser = RoutingFileParser::default();
    let routing = parser
        .parse(&text)
        .with_context(|| format!("{} is not a usable routing file", args.file.display()))?;
    let context = args.context.to_context();
    let candidates = parser.resolve_routes(&routing, &context);

    if args.format == "json" {
        let rows: Vec<_> = candidates
            .iter()
            .map(|c| {
                serde_json::json!({
                    "route": c.route_name,
                    "priority": c.priority,
                    "pattern": c.pattern,
                    "path": c.path,
                    "routing_variables": c.routing_variables,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("(no route matches this context)");
        return Ok(());
    }

    println!("{:<24}  {:>8}  {}", "ROUTE", "PRIORITY", "PATH");
    println!("{}", "─".repeat(80));
    for c in &candidates {
        println!(
            "{:<24}  {:>8}  {}",
            super::truncate(&c.route_name, 24),
            c.priority,
            c.path
        );
    }
    println!();
    Ok(())
}
