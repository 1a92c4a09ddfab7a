use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{format_bytes, format_number, open_seeker};

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let seeker = open_seeker(&database, "mmap")?;
    let header = seeker
        .header()
        .context("Database loaded without a header")?;
    let size = seeker.file_size();
    let version = seeker.version();

    if json_output {
        let output = json!({
            "file": database.display().to_string(),
            "file_size": size,
            "index_begin": header.index_begin,
            "index_end": header.index_end,
            "entry_count": header.entry_count(),
            "data_entry_count": header.data_entry_count(),
            "version": version,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Database: {}", database.display());
        println!("Size:     {} ({} bytes)", format_bytes(size), size);
        println!();
        println!("Index:");
        println!("  Begin offset:    {}", header.index_begin);
        println!("  End offset:      {}", header.index_end);
        println!(
            "  Entries:         {}",
            format_number(header.entry_count() as usize)
        );
        println!(
            "  Data ranges:     {}",
            format_number(header.data_entry_count() as usize)
        );
        println!();
        println!("Version:  {}", version.as_deref().unwrap_or("(unreadable)"));
    }

    Ok(())
}
