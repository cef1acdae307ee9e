//! Tests for damaged and unusual container bytes.
//!
//! Every failure must surface as an error, never a panic, and errors that
//! mean "not a usable archive" must be classified as format errors.

mod common;

use pagezip::format::END_OF_CENTRAL_DIRECTORY_SIZE;
use pagezip::shell::{TRAILER, is_page_archive};
use pagezip::{Archive, ArchivePath, EntryOptions, Error, ReadLimits, Writer};

use common::{sample_page, write_default};

fn plain_container(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = Writer::in_memory().unwrap();
    for (name, data) in entries {
        writer
            .add_bytes(ArchivePath::new(name).unwrap(), data, &EntryOptions::new())
            .unwrap();
    }
    let (_, bytes) = writer.finish_to_vec(TRAILER.as_bytes()).unwrap();
    bytes
}

fn end_record_position(bytes: &[u8]) -> usize {
    bytes.len() - TRAILER.len() - END_OF_CENTRAL_DIRECTORY_SIZE
}

#[test]
fn test_empty_and_tiny_inputs() {
    for data in [&b""[..], b"PK", b"<html></html>"] {
        let err = Archive::open(data.to_vec()).unwrap_err();
        assert!(err.is_format_error(), "unexpected error: {err}");
        assert!(!is_page_archive(data));
    }
}

#[test]
fn test_truncated_archives_fail_cleanly() {
    let bytes = write_default(&sample_page());
    for cut in [1, 10, TRAILER.len() + 5, bytes.len() / 2, bytes.len() - 1] {
        let truncated = &bytes[..bytes.len() - cut];
        if let Err(e) = Archive::open(truncated.to_vec()) {
            assert!(
                e.is_format_error() || matches!(e, Error::ResourceLimitExceeded(_)),
                "cut {cut}: unexpected error {e}"
            );
        }
    }
}

#[test]
fn test_corrupt_end_record_signature() {
    let mut bytes = write_default(&sample_page());
    let position = end_record_position(&bytes);
    assert_eq!(&bytes[position..position + 4], b"PK\x05\x06");
    bytes[position] = b'X';
    let err = Archive::open(bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));
}

#[test]
fn test_directory_offset_past_end_record() {
    let mut bytes = write_default(&sample_page());
    let position = end_record_position(&bytes);
    // central directory offset field
    bytes[position + 16..position + 20].copy_from_slice(&u32::MAX.wrapping_sub(1).to_le_bytes());
    let err = Archive::open(bytes).unwrap_err();
    assert!(matches!(err, Error::CorruptHeader { .. }), "got {err}");
}

#[test]
fn test_flipped_payload_byte_is_detected() {
    let payload = b"body { margin: 0 }";
    let mut writer = Writer::in_memory().unwrap();
    writer
        .add_bytes(
            ArchivePath::new("stylesheet_0.css").unwrap(),
            payload,
            &EntryOptions::new().store_uncompressed(true),
        )
        .unwrap();
    let (_, mut bytes) = writer.finish_to_vec(TRAILER.as_bytes()).unwrap();
    let archive = Archive::open(bytes.clone()).unwrap();
    assert_eq!(archive.read_bytes("stylesheet_0.css").unwrap(), payload);

    let start = bytes
        .windows(payload.len())
        .position(|window| window == payload)
        .unwrap();
    bytes[start] ^= 0x20;
    let archive = Archive::open(bytes).unwrap();
    let err = archive.read_bytes("stylesheet_0.css").unwrap_err();
    assert!(matches!(err, Error::CrcMismatch { .. }), "got {err}");
    assert!(err.is_format_error());
}

#[test]
fn test_trailing_bytes_after_trailer() {
    let mut bytes = write_default(&sample_page());
    bytes.extend_from_slice(b"\n<!-- appended by a download tool -->\n");
    let archive = Archive::open(bytes).unwrap();
    assert_eq!(archive.len(), 5);
    assert!(archive.read_text("index.html").unwrap().contains("Sample page"));
}

#[test]
fn test_offsets_relative_to_container_start() {
    let container = plain_container(&[
        ("index.html", b"<p>relative</p>"),
        ("images/0.png", common::PNG_BYTES),
    ]);
    let mut bytes = b"<html><body>shell written separately</body><![CDATA[".to_vec();
    bytes.extend_from_slice(&container);

    let archive = Archive::open(bytes).unwrap();
    assert_eq!(archive.read_text("index.html").unwrap(), "<p>relative</p>");
    assert_eq!(archive.read_bytes("images/0.png").unwrap(), common::PNG_BYTES);
    assert!(archive.info().prefix_len > 0);
}

#[test]
fn test_missing_entry_is_format_error() {
    let archive = Archive::open(write_default(&sample_page())).unwrap();
    let err = archive.read_text("stylesheet_9.css").unwrap_err();
    assert!(matches!(err, Error::EntryNotFound { ref path } if path == "stylesheet_9.css"));
    assert!(err.is_format_error());
}

#[test]
fn test_entry_count_limit() {
    let bytes = write_default(&sample_page());
    let err = Archive::open_with_limits(bytes, ReadLimits::default().max_entries(2)).unwrap_err();
    assert!(matches!(err, Error::ResourceLimitExceeded(_)));
}
