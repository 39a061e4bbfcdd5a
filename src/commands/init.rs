//! The `pasat init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute(path: &Path) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    std::fs::write(path, SAMPLE_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());

    println!("\nNext steps:");
    println!("  1. Adjust the interval and trial length in {}", path.display());
    println!(
        "  2. Run: pasat run --config {} --code P01 --name \"Jane Doe\"",
        path.display()
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# pasat configuration

# Digits presented in the PASAT run (at least 2).
numbers_per_trial = 10

# Seconds between two digits (at least 2).
interval_secs = 3

# Digit pairs in the demo run (at least 2).
pairs_in_demo = 2

show_timer = true
show_demo = true

# "en" or "fa": audio directory and digit script.
language = "en"

# Step of the pause-aware wait loops, in milliseconds.
poll_granularity_ms = 10
"#;
