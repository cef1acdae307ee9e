//! Fuzz target for the headless bootstrap.
//!
//! Drives the whole reader pipeline (container parsing, entry
//! classification, reference resolution, document parsing) over
//! arbitrary bytes. Every failure must end in the error state.
//!
//! Run with: cargo +nightly fuzz run bootstrap

#![no_main]

use libfuzzer_sys::fuzz_target;
use pagezip::{Bootstrap, BootstrapState, HeadlessHost};

fuzz_target!(|data: &[u8]| {
    let mut bootstrap = Bootstrap::new(HeadlessHost::unreadable("fuzzing"));
    let result = bootstrap.run_with_bytes(data.to_vec());

    match result {
        Ok(_) => assert_eq!(bootstrap.state(), BootstrapState::Done),
        Err(_) => assert_eq!(bootstrap.state(), BootstrapState::Error),
    }
    let _ = bootstrap.host().render();
});
