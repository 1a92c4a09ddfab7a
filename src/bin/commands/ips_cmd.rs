use anyhow::Result;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::cli_utils::open_seeker;

pub fn cmd_ips(database: PathBuf) -> Result<()> {
    let seeker = open_seeker(&database, "mmap")?;

    let mut out = BufWriter::new(io::stdout().lock());
    for ip in seeker.all_ips() {
        writeln!(out, "{}", ip)?;
    }
    out.flush()?;

    Ok(())
}
