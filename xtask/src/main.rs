//! xtask for sumkeep - build automation and tooling
//!
//! This binary provides development tasks like man page generation.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for sumkeep")]
enum Task {
    /// Generate man pages from clap definitions
    GenerateManPages {
        /// Output directory for man pages (default: ./man)
        #[arg(short, long, default_value = "man")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    match Task::parse() {
        Task::GenerateManPages { output } => generate_man_pages(&output),
    }
}

/// Render `man` to `path`
fn render(man: clap_mangen::Man, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create man page: {}", path.display()))?;
    man.render(&mut std::io::BufWriter::new(file))?;
    println!("✓ Generated: {}", path.display());
    Ok(())
}

fn generate_man_pages(output_dir: &Path) -> Result<()> {
    println!("Generating man pages...");

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let cmd = sumkeep::cli::Cli::command();
    render(
        clap_mangen::Man::new(cmd.clone()),
        &output_dir.join("sumkeep.1"),
    )?;

    // One page per subcommand, named like git's (sumkeep-new.1, ...)
    for sub in cmd.get_subcommands() {
        let name = format!("sumkeep-{}", sub.get_name());
        let path = output_dir.join(format!("{name}.1"));
        render(clap_mangen::Man::new(sub.clone()).title(name), &path)?;
    }

    println!(
        "\nMan pages successfully generated in: {}",
        output_dir.display()
    );
    println!("\nTo view the man pages:");
    println!("  man {}/sumkeep.1", output_dir.display());

    Ok(())
}
