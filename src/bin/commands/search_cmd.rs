use anyhow::Result;
use std::path::PathBuf;

use crate::cli_utils::open_seeker;

pub fn cmd_search(
    database: PathBuf,
    fragment: String,
    json_output: bool,
    limit: Option<usize>,
) -> Result<()> {
    let seeker = open_seeker(&database, "mmap")?;

    let mut found = seeker.find_by_name_fragment(&fragment);
    if let Some(limit) = limit {
        found.truncate(limit);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        for entry in &found {
            println!(
                "{}\t{}\t{}\t{}",
                entry.begin_ip, entry.end_ip, entry.country, entry.area
            );
        }
    }

    Ok(())
}
