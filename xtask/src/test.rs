use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    if !integration_only {
        suite("Unit tests", &["test", "--lib", "--workspace"], true)?;
    }
    if !unit_only {
        // Integration tests live under each crate's tests/ directory
        suite("Integration tests", &["test", "--tests", "--workspace"], true)?;
    }
    suite("Doc tests", &["test", "--doc", "--workspace"], false)?;
    if !unit_only && !integration_only {
        suite("Benchmarks build", &["bench", "--workspace", "--no-run"], false)?;
    }

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn suite(name: &str, args: &[&str], required: bool) -> Result<()> {
    println!("{}", format!("  Running {}...", name.to_lowercase()).cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {}", name.to_lowercase()))?;

    if output.status.success() {
        println!(
            "{}",
            format!(
                "  ✓ {} passed {} in {:.2}s",
                name,
                extract_test_summary(&output),
                start.elapsed().as_secs_f64()
            )
            .green()
        );
    } else if required {
        eprintln!("{}", format!("  ✗ {name} failed").red().bold());
        eprintln!();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            eprintln!("  {line}");
        }
        anyhow::bail!("{name} failed");
    } else {
        eprintln!("{}", format!("  ⚠ {name} failed").yellow().bold());
    }
    println!();
    Ok(())
}

/// Sum the "test result:" lines cargo prints once per test binary.
fn extract_test_summary(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let (mut passed, mut failed, mut binaries) = (0usize, 0usize, 0usize);
    for line in stdout.lines() {
        let Some(summary) = line.split("test result:").nth(1) else {
            continue;
        };
        binaries += 1;
        for part in summary.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(count) = count.parse::<usize>() else {
                continue;
            };
            match kind {
                "passed" => passed += count,
                "failed" => failed += count,
                _ => {}
            }
        }
    }
    if binaries == 0 {
        return "(summary not available)".to_string();
    }
    format!("({passed} passed, {failed} failed across {binaries} binaries)")
}
