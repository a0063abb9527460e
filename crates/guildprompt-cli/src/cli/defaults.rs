use super::DefaultsArgs;
use crate::config::GuildpromptConfig;
use anyhow::Result;

pub fn run(args: DefaultsArgs, config: &GuildpromptConfig) -> Result<()> {
    let provider = config.default_provider()?;

    if let Some(key) = &args.show {
        let text = match key.split_once('/') {
            Some((perspective, length)) => provider.get_hierarchical(perspective, length),
            None => provider.get_category(key),
        };
        match text {
            Some(t) => println!("{}", t),
            None => anyhow::bail!("No built-in template named '{}'", key),
        }
        return Ok(());
    }

    let categories = provider.categories();
    let perspectives = provider.perspectives();

    match args.format.as_str() {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "categories": categories,
                "perspectives": perspectives,
            }))?
        ),
        _ => {
            println!();
            println!("Categories");
            println!("{}", "─".repeat(50));
            for name in &categories {
                println!("  {}", name);
            }
            println!();
            println!("Perspectives");
            println!("{}", "─".repeat(50));
            for (perspective, lengths) in &perspectives {
                println!("  {:16} {}", perspective, lengths.join(", "));
            }
            println!();
        }
    }
    Ok(())
}
