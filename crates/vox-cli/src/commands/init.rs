//! Initialize vox.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use vox_config::Config;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    if paths.is_initialized() {
        println!("{} vox is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        return Ok(());
    }

    println!("{}", "Initializing vox...".cyan().bold());

    paths
        .ensure_dirs()
        .context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        paths.config_file.display()
    );

    println!();
    println!("{}", "vox initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Check your tools: {}", "vox check".cyan());
    println!("  2. Start the server: {}", "vox serve".cyan());
    println!(
        "  3. Or ask directly: {}",
        "vox query interview.mp3 -q \"What did they say about pricing?\"".cyan()
    );

    Ok(())
}
