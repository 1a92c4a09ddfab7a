use anyhow::{Context, Result};
use ipseek::{file_reader, DatabaseBuilder};
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use crate::cli_utils::{format_bytes, format_number};

/// Read `begin,end,country[,area]` rows into the builder
///
/// A first row whose begin column is not an address is taken as a header
/// and skipped. Lines starting with `#` are comments.
fn read_ranges(input: &Path, builder: &mut DatabaseBuilder) -> Result<usize> {
    let reader = file_reader::open(input)
        .with_context(|| format!("Failed to open input: {}", input.display()))?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut count = 0;
    for (row, result) in csv_reader.records().enumerate() {
        let record = result
            .with_context(|| format!("{}: failed to read row {}", input.display(), row + 1))?;
        let begin = record.get(0).unwrap_or("");
        if row == 0 && begin.parse::<Ipv4Addr>().is_err() {
            continue;
        }
        if record.len() < 3 {
            anyhow::bail!(
                "{}: row {} needs at least begin,end,country columns",
                input.display(),
                row + 1
            );
        }
        builder
            .add_entry(
                begin,
                record.get(1).unwrap_or(""),
                record.get(2).unwrap_or(""),
                record.get(3).unwrap_or(""),
            )
            .with_context(|| format!("{}: invalid row {}", input.display(), row + 1))?;
        count += 1;
    }
    Ok(count)
}

pub fn cmd_build(inputs: Vec<PathBuf>, output: PathBuf) -> Result<()> {
    let mut builder = DatabaseBuilder::new();
    for input in &inputs {
        let count = read_ranges(input, &mut builder)?;
        log::info!("{}: {} ranges", input.display(), count);
    }

    let database_bytes = builder.build().context("Failed to build database")?;
    fs::write(&output, &database_bytes)
        .with_context(|| format!("Failed to save database: {}", output.display()))?;

    println!("✓ Database built: {}", output.display());
    println!("  Ranges:        {}", format_number(builder.len()));
    println!(
        "  Database size: {}",
        format_bytes(database_bytes.len() as u64)
    );

    Ok(())
}
