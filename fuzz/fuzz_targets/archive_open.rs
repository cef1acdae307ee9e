//! Fuzz target for Archive::open with arbitrary byte input.
//!
//! Exercises end record location, central directory parsing and entry
//! decoding with malformed or adversarial input. The goal is to find
//! panics, hangs, or runaway allocations.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use pagezip::ReadLimits;

fuzz_target!(|data: &[u8]| {
    let limits = ReadLimits::default().max_entry_unpacked(16 * 1024 * 1024);

    // We don't care about the result - we're looking for panics or hangs
    let Ok(archive) = pagezip::Archive::open_with_limits(data.to_vec(), limits) else {
        return;
    };

    for entry in archive.entries() {
        let _ = entry.path.as_str();
        let _ = entry.comment();
        let _ = archive.read_entry_bytes(entry);
    }
    let _ = pagezip::shell::ShellLayout::inspect(data);
});
