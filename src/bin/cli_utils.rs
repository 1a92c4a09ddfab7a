use anyhow::{anyhow, Context, Result};
use ipseek::{AccessMode, Region, Seeker};
use std::path::Path;

/// Open a database strictly, with the access mode named on the command line
pub fn open_seeker(database: &Path, mode: &str) -> Result<Seeker> {
    let mode: AccessMode = mode.parse().map_err(|e: String| anyhow!(e))?;
    Seeker::from(database)
        .access_mode(mode)
        .open()
        .with_context(|| format!("Failed to load database: {}", database.display()))
}

/// Tab-separated country, province and city, `-` for missing parts
pub fn region_columns(region: &Region) -> String {
    [&region.country, &region.province, &region.city]
        .iter()
        .map(|part| part.as_deref().unwrap_or("-"))
        .collect::<Vec<_>>()
        .join("\t")
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
