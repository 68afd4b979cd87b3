use anyhow::{Context, Result};
use clap::Parser;
use glob::glob;
use sheet_merger::core::duplicates::find_duplicates;
use sheet_merger::core::pipeline::read_source;
use sheet_merger::utils::logger;
use sheet_merger::LocalStorage;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "check-duplicates")]
#[command(about = "Check spreadsheets in a folder for duplicate values in one column")]
struct Args {
    /// Folder containing the spreadsheet files
    #[arg(default_value = ".")]
    folder: PathBuf,

    /// Column to check (0 = A, 1 = B)
    #[arg(short, long, default_value = "1")]
    column: usize,

    /// Treat the first row as data instead of a header
    #[arg(long)]
    no_header: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

const PATTERNS: &[&str] = &["*.xlsx", "*.xls", "*.csv"];

fn spreadsheet_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in PATTERNS {
        let pattern = format!("{}/{}", folder.display(), pattern);
        for entry in glob(&pattern).with_context(|| format!("invalid pattern {}", pattern))? {
            files.push(entry?);
        }
    }
    files.sort();
    Ok(files)
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    println!("Duplicate checker - column {}", args.column);
    println!("{}", "=".repeat(40));

    if !args.folder.exists() {
        anyhow::bail!("Folder '{}' does not exist", args.folder.display());
    }

    let files = spreadsheet_files(&args.folder)?;
    if files.is_empty() {
        println!("No spreadsheet files found in '{}'", args.folder.display());
        return Ok(());
    }

    println!(
        "Checking {} files in '{}'...\n",
        files.len(),
        args.folder.display()
    );

    let storage = LocalStorage::default();
    let mut checked = 0;
    let mut with_duplicates = 0;

    for path in &files {
        let name = path.display().to_string();
        println!("Checking: {}", name);

        let result = read_source(&storage, &name)
            .and_then(|table| find_duplicates(&table, args.column, !args.no_header));

        match result {
            Ok(report) if report.has_duplicates() => {
                with_duplicates += 1;
                println!("  ⚠️  DUPLICATES FOUND!");
                println!("     Values checked: {}", report.total_values);
                println!("     Duplicate values: {:?}", report.duplicates);
            }
            Ok(report) => {
                println!(
                    "  ✅ No duplicates found (checked {} values)",
                    report.total_values
                );
            }
            Err(e) => {
                tracing::debug!("{:?}", e);
                println!("  ❌ {}", e);
            }
        }

        checked += 1;
        println!();
    }

    println!("{}", "=".repeat(50));
    println!("SUMMARY:");
    println!("Total files checked: {}", checked);
    println!("Files with duplicates: {}", with_duplicates);
    println!("Files without duplicates: {}", checked - with_duplicates);

    Ok(())
}
