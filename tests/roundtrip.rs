//! Page archive round-trip tests.
//!
//! A page written by the archiver and read back by the bootstrap must
//! rebuild the captured markup with every sibling reference inlined.

mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use pagezip::bootstrap::{data_uri, load_resources, resolve_references};
use pagezip::shell::{ShellLayout, TRAILER, is_page_archive};
use pagezip::{Archive, ArchiveOptions, HeadlessHost, PageData, ResourceEntry, write_page};

use common::{PNG_BYTES, nested_frames_page, open_page, sample_page, write_default};

fn decode_data_uri(uri: &str) -> String {
    let (_, encoded) = uri.split_once(";base64,").expect("not a base64 data URI");
    String::from_utf8(STANDARD.decode(encoded).expect("invalid base64")).expect("not UTF-8")
}

fn extract_data_uri<'a>(markup: &'a str, mime_type: &str) -> &'a str {
    let start = markup
        .find(&format!("data:{mime_type}"))
        .expect("data URI not found");
    let rest = &markup[start..];
    let end = rest.find('"').unwrap_or(rest.len());
    &rest[..end]
}

// =============================================================================
// Markup Round-Trip
// =============================================================================

#[test]
fn test_root_markup_round_trip() {
    let page = sample_page();
    let archive = Archive::open(write_default(&page)).unwrap();
    let mut host = HeadlessHost::new(Vec::<u8>::new());
    let mut resources = load_resources(&archive, &mut host).unwrap();
    let (markup, stats) = resolve_references(&mut resources).unwrap();

    // object URLs follow entry order: the image, then the font
    let image_url = "blob:pagezip/00000001";
    let font_url = "blob:pagezip/00000002";
    assert_eq!(host.object_data(image_url), Some(("application/octet-stream", PNG_BYTES)));

    let stylesheet = "@font-face { src: url(fonts/0.woff2) } h1 { color: teal }"
        .replace("fonts/0.woff2", font_url);
    let expected = page
        .content
        .replace(
            "stylesheet_0.css",
            &data_uri("text/css;charset=utf-8", stylesheet.as_bytes()),
        )
        .replace(
            "scripts/0.js",
            &data_uri("text/javascript;charset=utf-8", b"document.title += '!';"),
        )
        .replace("images/0.png", image_url);

    assert_eq!(markup, expected);
    assert_eq!(stats.resources, 5);
    assert_eq!(stats.text_resources, 3);
    assert_eq!(stats.unresolved, 0);
}

#[test]
fn test_rendered_page_is_self_contained() {
    let host = open_page(write_default(&sample_page()));
    let rendered = host.render().expect("document was not replaced");

    assert!(!rendered.contains("blob:pagezip/"));
    assert!(!rendered.contains("stylesheet_0.css"));
    assert!(!rendered.contains("<noscript"));
    assert!(rendered.contains(&data_uri("application/octet-stream", PNG_BYTES)));
    assert!(rendered.contains("Sample page"));

    let stylesheet = decode_data_uri(extract_data_uri(&rendered, "text/css"));
    assert!(stylesheet.contains("h1 { color: teal }"));
    assert!(stylesheet.contains("blob:pagezip/00000002"));
}

#[test]
fn test_entry_comments_keep_urls() {
    let archive = Archive::open(write_default(&sample_page())).unwrap();
    let comment = |path: &str| archive.entry(path).and_then(|e| e.comment()).map(str::to_string);

    assert_eq!(comment("index.html").as_deref(), Some("https://example.com/sample"));
    assert_eq!(comment("stylesheet_0.css").as_deref(), Some("https://example.com/style.css"));
    assert_eq!(comment("fonts/0.woff2").as_deref(), Some("https://example.com/f.woff2"));
}

#[test]
fn test_archive_is_html_document() {
    let bytes = write_default(&sample_page());
    assert!(bytes.starts_with(b"<!DOCTYPE html>") || bytes.starts_with(b"<!doctype html>"));
    assert!(bytes.ends_with(TRAILER.as_bytes()));
    assert!(is_page_archive(&bytes));

    let layout = ShellLayout::inspect(&bytes).unwrap();
    assert_eq!(layout.total_size, bytes.len() as u64);
    assert_eq!(layout.trailer_size, TRAILER.len() as u64);
    let shell = std::str::from_utf8(&bytes[..layout.prefix_size as usize]).unwrap();
    assert!(shell.contains("<title>Sample</title>"));
    assert!(shell.ends_with("<![CDATA["));
}

// =============================================================================
// Determinism and Compression
// =============================================================================

#[test]
fn test_identical_pages_produce_identical_archives() {
    let first = write_default(&sample_page());
    let second = write_default(&sample_page());
    assert_eq!(first, second);

    let options = ArchiveOptions::new().insert_text_body(true);
    let first = write_page(&nested_frames_page(), &options).unwrap();
    let second = write_page(&nested_frames_page(), &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_precompressed_extensions_are_stored() {
    let extensions = [
        ".jpg", ".jpeg", ".png", ".pdf", ".woff2", ".mp4", ".mp3", ".ogg", ".webp", ".webm",
    ];
    let mut page = PageData::new("<p>media</p>");
    for (index, extension) in extensions.iter().enumerate() {
        page = page.resource(
            "media",
            ResourceEntry::new(format!("media/{index}{extension}"), vec![0u8; 512]),
        );
    }
    page = page
        .resource("media", ResourceEntry::new("media/text.svg", "<svg>".repeat(100)))
        .resource("stylesheets", ResourceEntry::new("stylesheet_0.css", "a{}".repeat(200)));

    let archive = Archive::open(write_default(&page)).unwrap();
    for (index, extension) in extensions.iter().enumerate() {
        let entry = archive.entry(&format!("media/{index}{extension}")).unwrap();
        assert!(entry.is_stored(), "{} should be stored", entry.path);
        assert_eq!(entry.compressed_size, entry.size);
    }
    #[cfg(feature = "deflate")]
    {
        assert!(!archive.entry("media/text.svg").unwrap().is_stored());
        assert!(!archive.entry("stylesheet_0.css").unwrap().is_stored());
        assert!(!archive.entry("index.html").unwrap().is_stored());
    }
}

// =============================================================================
// Frames
// =============================================================================

#[test]
fn test_nested_frame_entries_are_prefixed() {
    let archive = Archive::open(write_default(&nested_frames_page())).unwrap();
    let paths: Vec<_> = archive.entries().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "index.html",
            "frames/0/index.html",
            "frames/0/frames/0/index.html",
            "frames/0/frames/0/images/0.png",
        ]
    );
    assert_eq!(
        archive.entry("frames/0/frames/0/index.html").unwrap().comment(),
        Some("https://example.com/inner")
    );
}

#[test]
fn test_nested_frames_become_inline_documents() {
    let host = open_page(write_default(&nested_frames_page()));
    assert_eq!(host.object_url_count(), 0);
    let rendered = host.render().unwrap();
    assert!(rendered.contains("outer"));
    assert!(!rendered.contains("frames/0/index.html"));

    let middle = decode_data_uri(extract_data_uri(&rendered, "text/html"));
    assert!(middle.contains("middle"));
    assert!(!middle.contains("frames/0/index.html"));

    let inner = decode_data_uri(extract_data_uri(&middle, "text/html"));
    assert!(inner.contains("inner"));
    assert!(inner.contains(&data_uri("application/octet-stream", PNG_BYTES)));
}
