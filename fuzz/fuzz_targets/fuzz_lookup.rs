#![no_main]
use libfuzzer_sys::fuzz_target;
use std::net::Ipv4Addr;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (ip, db) = data.split_at(4);
    let ip = Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]);

    // Corrupt records and runaway redirects must surface as errors
    if let Ok(seeker) = ipseek::Seeker::from_bytes(db.to_vec()) {
        let _ = seeker.try_lookup(ip);
        let _ = seeker.lookup(ip);
        let _ = seeker.find_by_name_fragment("a");
    }
});
