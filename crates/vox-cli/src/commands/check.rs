//! Check command - report which external dependencies are usable.

use super::load_config;
use anyhow::{Context, Result};
use colored::Colorize;
use tokio::runtime::Runtime;
use vox_ollama::OllamaClient;

pub fn run() -> Result<()> {
    let config = load_config()?;

    println!("{}", "vox Check".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Media Tools".white().bold());
    for (tool, available) in vox_process::check_dependencies() {
        if available {
            println!("  {} {}", "✓".green(), tool);
        } else {
            println!("  {} {} {}", "✗".red(), tool, "(not found in PATH)".dimmed());
        }
    }
    if !vox_process::all_tools_available() {
        println!(
            "  {} Audio and video uploads need ffmpeg and whisper (pip install openai-whisper).",
            "Note:".yellow()
        );
    }

    println!();
    println!("{}", "Ollama".white().bold());
    let client =
        OllamaClient::from_config(&config.ollama).context("Failed to create Ollama client")?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    if !rt.block_on(client.is_available()) {
        println!(
            "  {} Not reachable at {}. Start it with 'ollama serve'.",
            "✗".red(),
            client.host()
        );
        return Ok(());
    }
    println!("  {} Running at {}", "✓".green(), client.host());

    for model in [&config.ollama.embedding_model, &config.ollama.model] {
        match rt.block_on(client.has_model(model)) {
            Ok(true) => println!("  {} Model {}", "✓".green(), model),
            Ok(false) => println!(
                "  {} Model {} missing. Run 'ollama pull {}'.",
                "✗".red(),
                model,
                model
            ),
            Err(e) => println!("  {} Model {}: {}", "✗".red(), model, e),
        }
    }

    Ok(())
}
