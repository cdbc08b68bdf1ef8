use anyhow::{Context, Result};
use std::io::Read;

use toxiguard::api;
use toxiguard::models::AnalyzeRequest;
use toxiguard::services::config_store::ConfigStore;
use toxiguard::services::detection::AnalyzerRegistry;

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

#[tokio::main]
async fn main() -> Result<()> {
    toxiguard::init_logging();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        eprintln!(
            "Usage:\n  moderate [--health] [text...]\n\nReads the submission from arguments, or from stdin when none are given,\nand prints the toxicity verdict as JSON. Configuration is read from the\nplatform config dir; set OPENROUTER_API_KEY to enable the LLM judge."
        );
        return Ok(());
    }

    let config = match ConfigStore::default_config_dir() {
        Some(dir) => ConfigStore::new(dir)
            .load()
            .unwrap_or_default(),
        None => Default::default(),
    };
    let registry = AnalyzerRegistry::from_config(&config);

    if has_flag(&args, "--health") {
        let status = api::health(&registry);
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let text = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        buf
    };

    let verdict = api::analyze_text(&registry, AnalyzeRequest { text }).await;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(())
}
