use chrono::Local;
use std::fs;
use std::io::{self, Write};
use std::process::Command;
use toml_edit::{DocumentMut, Item};

const CHANGELOG: &str = "CHANGELOG.md";
const UNRELEASED: &str = "## [Unreleased]";

fn run(program: &str, args: &[&str]) -> Result<String, Box<dyn std::error::Error>> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(format!(
            "`{} {}` failed: {}",
            program,
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )
        .into());
    }
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

fn confirm(message: &str) -> Result<bool, io::Error> {
    print!("{} (y/n): ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn prompt(message: &str) -> Result<String, io::Error> {
    println!("{}", message);
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Notes since the last tag, one commit subject per line
fn release_notes() -> Result<String, Box<dyn std::error::Error>> {
    match run("git", &["describe", "--tags", "--abbrev=0"]) {
        Ok(tag) => {
            println!("Previous tag: {}", tag);
            run("git", &["log", "--pretty=format:- %s", &format!("{}..HEAD", tag)])
        }
        Err(_) => {
            println!("Previous tag: None");
            run("git", &["log", "--pretty=format:- %s"])
        }
    }
}

/// Turns the Unreleased heading into a dated heading for `version`,
/// leaving a fresh Unreleased heading above it.
fn stamp_changelog(version: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let changelog = match fs::read_to_string(CHANGELOG) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if !changelog.contains(UNRELEASED) {
        return Ok(false);
    }

    let dated = format!(
        "{}\n\n## [{}] - {}",
        UNRELEASED,
        version,
        Local::now().format("%Y-%m-%d")
    );
    fs::write(CHANGELOG, changelog.replacen(UNRELEASED, &dated, 1))?;
    Ok(true)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest = fs::read_to_string("Cargo.toml")?;
    let mut doc = manifest.parse::<DocumentMut>()?;

    let current = doc["package"]["version"]
        .as_str()
        .ok_or("Could not find package.version in Cargo.toml")?
        .to_string();

    println!("Current version is: {}", current);
    let version = prompt("Enter new version:")?;
    if version.is_empty() {
        return Err("Version cannot be empty".into());
    }
    if version == current {
        return Err(format!("{} is already the current version", version).into());
    }

    if !confirm(&format!("Ready to release octothorpe {}?", version))? {
        println!("Release aborted.");
        return Ok(());
    }

    // The tests have to pass before anything is written
    println!("Running tests...");
    if !Command::new("cargo").args(["test", "--all-features"]).status()?.success() {
        return Err("Tests failed; nothing was changed".into());
    }

    doc["package"]["version"] = Item::from(version.as_str());
    fs::write("Cargo.toml", doc.to_string())?;
    println!("Updated Cargo.toml to {}", version);

    let mut staged = vec!["Cargo.toml", "Cargo.lock"];
    if stamp_changelog(&version)? {
        println!("Stamped {} for {}", CHANGELOG, version);
        staged.push(CHANGELOG);
    } else {
        println!("Warning: no `{}` heading in {}", UNRELEASED, CHANGELOG);
    }

    // Refresh Cargo.lock for the new version
    run("cargo", &["check", "--quiet"])?;

    let notes = release_notes()?;
    if notes.is_empty() && !confirm("No commits since the last tag. Continue?")? {
        println!("Release aborted.");
        return Ok(());
    }
    println!("Release notes:\n{}", notes);

    let tag = format!("v{}", version);
    let mut add = vec!["add"];
    add.extend(&staged);
    run("git", &add)?;
    run("git", &["commit", "-m", &format!("Release {}", version)])?;
    run("git", &["tag", "-a", &tag, "-m", &format!("Version {}", version)])?;
    run("git", &["push"])?;
    run("git", &["push", "--tags"])?;
    println!("Tagged {}", tag);

    if confirm("Publish to crates.io?")? {
        if !Command::new("cargo").arg("publish").status()?.success() {
            return Err("Failed to publish to crates.io".into());
        }
    } else {
        println!("Skipping crates.io publishing.");
    }

    if confirm("Create GitHub release?")? {
        run("gh", &["release", "create", &tag, "--title", &tag, "--notes", &notes])?;
    } else {
        println!("Skipping GitHub release creation.");
    }

    println!("Successfully released octothorpe {}", version);
    Ok(())
}
