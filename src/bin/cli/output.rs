//! Output formatting for CLI operations.

use serde_json::json;

use pagezip::bootstrap::BootstrapReport;
use pagezip::progress::format_bytes_iec;
use pagezip::shell::ShellLayout;
use pagezip::{ArchiveInfo, Entry, WriteResult};

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[Entry], info: &ArchiveInfo, layout: &ShellLayout) -> String;

    /// Formats the result of packing a page
    fn format_pack_result(&self, result: &WriteResult) -> String;

    /// Formats the result of extracting raw entries
    fn format_extract_result(&self, extracted: usize) -> String;

    /// Formats the result of rebuilding a page
    fn format_open_result(&self, report: &BootstrapReport, document_size: usize) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[Entry], info: &ArchiveInfo, layout: &ShellLayout) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{:>12} {:>12} {:>8} {:>10} {}\n",
            "Size", "Packed", "Method", "CRC", "Name"
        ));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        for entry in entries {
            output.push_str(&format!(
                "{:>12} {:>12} {:>8} {:>10} {}\n",
                format_bytes_iec(entry.size),
                format_bytes_iec(entry.compressed_size),
                entry.method.name(),
                format!("{:08X}", entry.crc32),
                entry.path.as_str(),
            ));
            if let Some(comment) = entry.comment() {
                output.push_str(&format!("{:>46}{}\n", "", comment));
            }
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} entries ({} stored), {} total, {} packed\n",
            info.entry_count,
            info.stored_entries,
            format_bytes_iec(info.total_size),
            format_bytes_iec(info.packed_size)
        ));
        output.push_str(&format!(
            "Shell {}, container {}, trailer {} ({:.1}% overhead)\n",
            format_bytes_iec(layout.prefix_size),
            format_bytes_iec(layout.container_size),
            format_bytes_iec(layout.trailer_size),
            layout.overhead_percent()
        ));

        output
    }

    fn format_pack_result(&self, result: &WriteResult) -> String {
        format!(
            "Packed {} entries ({} stored), {} -> {} ({:.1}% saved)\n",
            result.entries_written,
            result.stored_entries,
            format_bytes_iec(result.total_size),
            format_bytes_iec(result.archive_size),
            result.space_savings() * 100.0
        )
    }

    fn format_extract_result(&self, extracted: usize) -> String {
        format!("Extracted {} entries\n", extracted)
    }

    fn format_open_result(&self, report: &BootstrapReport, document_size: usize) -> String {
        let stats = &report.resolution;
        let mut output = format!(
            "Rebuilt page from {} resources ({} references replaced), {}\n",
            stats.resources,
            stats.substitutions,
            format_bytes_iec(document_size as u64)
        );
        if stats.unresolved > 0 {
            output.push_str(&format!("Unresolved references: {}\n", stats.unresolved));
        }
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[Entry], info: &ArchiveInfo, layout: &ShellLayout) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "path": e.path.as_str(),
                    "size": e.size,
                    "compressed_size": e.compressed_size,
                    "method": e.method.name(),
                    "crc32": e.crc32,
                    "comment": e.comment(),
                })
            })
            .collect();

        let obj = json!({
            "entries": items,
            "total_size": info.total_size,
            "packed_size": info.packed_size,
            "stored_entries": info.stored_entries,
            "prefix_size": layout.prefix_size,
            "container_size": layout.container_size,
            "trailer_size": layout.trailer_size,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_pack_result(&self, result: &WriteResult) -> String {
        let obj = json!({
            "entries_written": result.entries_written,
            "stored_entries": result.stored_entries,
            "total_size": result.total_size,
            "compressed_size": result.compressed_size,
            "prefix_size": result.prefix_size,
            "archive_size": result.archive_size,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_extract_result(&self, extracted: usize) -> String {
        let obj = json!({ "entries_extracted": extracted });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_open_result(&self, report: &BootstrapReport, document_size: usize) -> String {
        let obj = json!({
            "resources": report.resolution.resources,
            "text_resources": report.resolution.text_resources,
            "substitutions": report.resolution.substitutions,
            "unresolved": report.resolution.unresolved,
            "noscript_removed": report.noscript_removed,
            "scripts_recreated": report.scripts_recreated,
            "document_size": document_size,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}
