#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Garbage must be rejected, never panic
    if let Ok(seeker) = ipseek::Seeker::from_bytes(data.to_vec()) {
        let _ = seeker.version();
        for _ in seeker.all_ips().take(64) {}
    }
});
