//! Command implementations for the CLI tool.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pagezip::shell::ShellLayout;
use pagezip::{
    Archive, ArchiveOptions, Bootstrap, HeadlessHost, Outcome, PageData, WriteOptions,
    progress_fn, write_page_to,
};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;

/// Configuration for the pack command.
pub struct PackConfig<'a> {
    pub page_path: &'a Path,
    pub archive_path: &'a Path,
    pub insert_text_body: bool,
    pub level: u32,
    pub url: Option<String>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Pack command implementation
pub fn pack(config: &PackConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let page = match read_page(config.page_path) {
        Ok(page) => page,
        Err(e) => {
            eprintln!("Error reading {}: {}", config.page_path.display(), e);
            return error_to_exit_code(&e);
        }
    };

    let write = match WriteOptions::new().level(config.level) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::BadArgs;
        }
    };
    let mut options = ArchiveOptions::new()
        .insert_text_body(config.insert_text_body)
        .write(write);
    if let Some(url) = &config.url {
        options = options.url(url.as_str());
    }

    let file = match File::create(config.archive_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error creating archive: {}", e);
            return ExitCode::IoError;
        }
    };

    let quiet = config.quiet;
    let mut progress = progress_fn(move |name: &str, success: bool| {
        if !quiet && success {
            eprintln!("  added {}", name);
        }
    });

    let result = write_page_to(BufWriter::new(file), &page, &options, &mut progress)
        .and_then(|(result, mut sink)| {
            sink.flush()?;
            Ok(result)
        });

    match result {
        Ok(result) => {
            print_output(&formatter.format_pack_result(&result));
            ExitCode::Success
        }
        Err(e) => {
            // a failed capture leaves no partial archive behind
            let _ = std::fs::remove_file(config.archive_path);
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// List command implementation
pub fn list(archive_path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let layout = match ShellLayout::inspect(archive.as_bytes()) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    print_output(&formatter.format_list(archive.entries(), archive.info(), &layout));
    ExitCode::Success
}

/// Extract command implementation
pub fn extract(
    archive_path: &Path,
    output_dir: &Path,
    format: OutputFormat,
    quiet: bool,
) -> ExitCode {
    let formatter = create_formatter(format);

    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        eprintln!("Error creating output directory: {}", e);
        return ExitCode::IoError;
    }

    match archive.extract_to(output_dir) {
        Ok(count) => {
            if !quiet || format == OutputFormat::Json {
                print_output(&formatter.format_extract_result(count));
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// Open command implementation
pub fn open(
    archive_path: &Path,
    output_path: &Path,
    format: OutputFormat,
    quiet: bool,
) -> ExitCode {
    let formatter = create_formatter(format);

    let mut bootstrap = Bootstrap::new(HeadlessHost::from_path(archive_path));
    let report = match bootstrap.run() {
        Ok(Outcome::Completed(report)) => report,
        Ok(Outcome::AlreadyStarted) => {
            eprintln!("Error: bootstrap already started");
            return ExitCode::FatalError;
        }
        Err(e) => {
            eprintln!("Error opening {}: {}", archive_path.display(), e);
            return error_to_exit_code(&e);
        }
    };

    let Some(document) = bootstrap.host().render() else {
        eprintln!("Error: no document was rebuilt");
        return ExitCode::FatalError;
    };

    if let Err(e) = std::fs::write(output_path, document.as_bytes()) {
        eprintln!("Error writing {}: {}", output_path.display(), e);
        return ExitCode::IoError;
    }

    if !quiet || format == OutputFormat::Json {
        print_output(&formatter.format_open_result(&report, document.len()));
    }
    ExitCode::Success
}

fn read_page(path: &Path) -> pagezip::Result<PageData> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn open_archive(path: &Path) -> Result<Archive, ExitCode> {
    Archive::open_path(path).map_err(|e| {
        eprintln!("Error opening archive: {}", e);
        error_to_exit_code(&e)
    })
}

fn print_output(text: &str) {
    println!("{}", text.trim_end());
}

