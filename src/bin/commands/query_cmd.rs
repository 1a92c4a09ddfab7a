use anyhow::Result;
use ipseek::classify;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{open_seeker, region_columns};

pub fn cmd_query(
    database: PathBuf,
    ips: Vec<String>,
    json_output: bool,
    region: bool,
    mode: String,
    quiet: bool,
) -> Result<()> {
    let seeker = open_seeker(&database, &mode)?;

    let results: Vec<_> = ips
        .iter()
        .map(|ip| (ip.as_str(), seeker.location(ip)))
        .collect();
    let all_found = results.iter().all(|(_, location)| !location.is_unknown());

    if quiet {
        std::process::exit(if all_found { 0 } else { 1 });
    }

    if json_output {
        let output: Vec<_> = results
            .iter()
            .map(|(ip, location)| {
                let mut entry = json!({
                    "ip": ip,
                    "country": location.country,
                    "area": location.area,
                    "address": location.address(),
                });
                if region {
                    entry["region"] = json!(classify(&location.country));
                }
                entry
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (ip, location) in &results {
            if region {
                println!(
                    "{}\t{}\t{}\t{}",
                    ip,
                    location.country,
                    location.area,
                    region_columns(&classify(&location.country))
                );
            } else {
                println!("{}\t{}\t{}", ip, location.country, location.area);
            }
        }
    }

    std::process::exit(if all_found { 0 } else { 1 });
}
