//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use pagezip::{
    ArchiveOptions, Bootstrap, HeadlessHost, Outcome, PageData, ResourceEntry, write_page,
};

/// Smallest valid PNG signature, enough to be treated as an image.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// A page with one stylesheet, one script, one image and one font.
pub fn sample_page() -> PageData {
    PageData::new(concat!(
        "<!DOCTYPE html>\n<html><head><title>Sample</title>",
        "<link rel=\"stylesheet\" href=\"stylesheet_0.css\">",
        "</head><body><h1>Sample page</h1>",
        "<img src=\"images/0.png\">",
        "<noscript>enable scripts</noscript>",
        "<script src=\"scripts/0.js\"></script>",
        "</body></html>"
    ))
    .title("Sample")
    .url("https://example.com/sample")
    .resource(
        "stylesheets",
        ResourceEntry::new(
            "stylesheet_0.css",
            "@font-face { src: url(fonts/0.woff2) } h1 { color: teal }",
        )
        .url("https://example.com/style.css"),
    )
    .resource(
        "scripts",
        ResourceEntry::new("scripts/0.js", "document.title += '!';")
            .url("https://example.com/app.js"),
    )
    .resource(
        "images",
        ResourceEntry::new("images/0.png", PNG_BYTES.to_vec()).url("https://example.com/a.png"),
    )
    .resource(
        "fonts",
        ResourceEntry::new("fonts/0.woff2", vec![b'w', b'O', b'F', b'2', 0, 1, 0, 0])
            .url("https://example.com/f.woff2"),
    )
}

/// A page holding a frame that itself holds a frame.
pub fn nested_frames_page() -> PageData {
    let inner = PageData::new("<!DOCTYPE html><body><img src=\"images/0.png\">inner</body>")
        .url("https://example.com/inner")
        .name("frames/0")
        .resource("images", ResourceEntry::new("images/0.png", PNG_BYTES.to_vec()));
    let middle = PageData::new(
        "<!DOCTYPE html><body>middle<iframe src=\"frames/0/index.html\"></iframe></body>",
    )
    .url("https://example.com/middle")
    .name("frames/0/")
    .frame(inner);
    PageData::new("<!DOCTYPE html><body>outer<iframe src=\"frames/0/index.html\"></iframe></body>")
        .title("Nested")
        .url("https://example.com/outer")
        .frame(middle)
}

/// Writes `page` with default options.
pub fn write_default(page: &PageData) -> Vec<u8> {
    write_page(page, &ArchiveOptions::new()).expect("Failed to write page archive")
}

/// Runs the bootstrap over `bytes` and returns the host it drove.
pub fn open_page(bytes: Vec<u8>) -> HeadlessHost {
    let mut bootstrap = Bootstrap::new(HeadlessHost::new(bytes));
    match bootstrap.run().expect("Failed to rebuild page") {
        Outcome::Completed(_) => bootstrap.into_host(),
        Outcome::AlreadyStarted => panic!("fresh bootstrap reported an earlier run"),
    }
}
