use anyhow::{bail, Context, Result};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::cli_utils::open_seeker;

pub fn cmd_dump(database: PathBuf, format: String) -> Result<()> {
    let seeker = open_seeker(&database, "mmap")?;
    let stdout = io::stdout();

    match format.as_str() {
        "csv" => {
            let mut writer = csv::Writer::from_writer(stdout.lock());
            for entry in seeker.entries() {
                writer
                    .serialize(&entry)
                    .context("Failed to write CSV record")?;
            }
            writer.flush()?;
        }
        "json" => {
            let mut out = BufWriter::new(stdout.lock());
            for entry in seeker.entries() {
                serde_json::to_writer(&mut out, &entry)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        other => bail!("Unknown format: {}. Use 'csv' or 'json'", other),
    }

    Ok(())
}
