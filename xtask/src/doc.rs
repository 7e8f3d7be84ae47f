use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// Library crates whose rustdoc is built, in dependency order.
const CRATES: [&str; 3] = ["platform", "profile", "commander"];

/// Build rustdoc for each library crate with warnings denied, so a missing
/// doc comment or broken intra-doc link fails the task.
pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building library docs (warnings denied)...".cyan().bold());
    println!();

    let start = Instant::now();
    let mut failed = Vec::new();

    for name in CRATES {
        let crate_start = Instant::now();
        let output = Command::new("cargo")
            .args(["doc", "--no-deps", "-p", name])
            .env("RUSTDOCFLAGS", "-D warnings")
            .output()
            .with_context(|| format!("Failed to run rustdoc for {name}"))?;

        if output.status.success() {
            println!(
                "  {} {:<10} {:.2}s",
                "✓".green(),
                name,
                crate_start.elapsed().as_secs_f64()
            );
        } else {
            println!("  {} {name}", "✗".red().bold());
            for line in String::from_utf8_lossy(&output.stderr)
                .lines()
                .filter(|line| line.starts_with("error") || line.trim_start().starts_with("-->"))
            {
                eprintln!("      {line}");
            }
            failed.push(name);
        }
    }
    println!();

    if !failed.is_empty() {
        anyhow::bail!("rustdoc failed for {}", failed.join(", "));
    }
    println!(
        "{}",
        format!("✓ Docs built in {:.2}s", start.elapsed().as_secs_f64()).green()
    );

    let index = Path::new("target/doc/commander/index.html");
    if open {
        open_in_browser(index)?;
    } else {
        println!("   {}", index.display().to_string().dimmed());
    }
    println!();

    Ok(())
}

// `cargo doc --open` would rebuild; reuse the output instead.
fn open_in_browser(index: &Path) -> Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    Command::new(opener)
        .arg(index)
        .status()
        .with_context(|| format!("Failed to open {} with {opener}", index.display()))?;
    Ok(())
}
