//! Main entry point for the aa01 CLI application.
//!
//! This binary lists and extracts AA01 firmware-patch archives from both the
//! local filesystem and remote HTTP URLs.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use aa01::aa01::{ExtractOptions, ExtractOutcome, ExtractStats, write_payload};
use aa01::{Aa01Archive, Aa01Extractor, Cli, DataRecord, HttpRangeReader};

/// Application entry point.
///
/// Every input file is processed in turn. A file that fails to decode is
/// reported and the run moves on; the exit status is non-zero if any failed.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let mut failed = 0usize;
    for file in &cli.files {
        if let Err(e) = process_file(file, &cli) {
            eprintln!("aa01: {}: {:#}", file, e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} archives failed", failed, cli.files.len());
    }

    Ok(())
}

/// Open one input, local or remote, and run the selected mode over it.
fn process_file(file: &str, cli: &Cli) -> Result<()> {
    if Cli::is_http_url(file) {
        // Handle remote archive via HTTP Range requests
        let reader = Arc::new(HttpRangeReader::new(file.to_string())?);
        process_archive(&Aa01Archive::new(reader.clone()), cli)?;

        if !cli.is_quiet() {
            eprintln!(
                "\nTotal bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
    } else {
        let archive = Aa01Archive::open(Path::new(file))?;
        process_archive(&archive, cli)?;
    }

    Ok(())
}

/// Dispatch to extraction, pipe or listing mode.
fn process_archive(archive: &Aa01Archive, cli: &Cli) -> Result<()> {
    if let Some(ref dir) = cli.savedir {
        return extract_files(archive, Path::new(dir), cli);
    }

    if cli.pipe {
        return pipe_files(archive, cli);
    }

    list_entries(archive)
}

/// Print one line per decoded entity, in file order.
fn list_entries(archive: &Aa01Archive) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for entity in archive.entries() {
        writeln!(out, "{}", entity?)?;
    }

    Ok(())
}

/// Write every selected data payload below `dir`.
fn extract_files(archive: &Aa01Archive, dir: &Path, cli: &Cli) -> Result<()> {
    let extractor = Aa01Extractor::with_options(
        dir,
        ExtractOptions {
            overwrite: cli.overwrite_policy(),
        },
    );
    let mut stats = ExtractStats::default();

    for record in archive.data_records() {
        let record = record?;
        if is_excluded(&record, &cli.exclude) {
            continue;
        }

        let outcome = extractor.extract_record(&record).with_context(|| {
            format!(
                "while extracting {}",
                record.path.as_deref().unwrap_or("<unnamed>")
            )
        })?;

        if !cli.is_quiet() {
            match &outcome {
                ExtractOutcome::Written { .. } => {
                    println!("  extracting: {}", record.path.as_deref().unwrap_or_default())
                }
                ExtractOutcome::Skipped { .. } => eprintln!(
                    "Skipping: {} (file exists)",
                    record.path.as_deref().unwrap_or_default()
                ),
                ExtractOutcome::NoContent => {}
            }
        }

        stats.record(&outcome);
    }

    if !cli.is_very_quiet() {
        println!(
            "{} files extracted ({}), {} skipped",
            stats.files,
            format_size(stats.bytes),
            stats.skipped
        );
    }

    Ok(())
}

/// Write every selected data payload to stdout.
///
/// When more than one file is written each is preceded by a marker line.
fn pipe_files(archive: &Aa01Archive, cli: &Cli) -> Result<()> {
    let mut selected = Vec::new();
    for record in archive.data_records() {
        let record = record?;
        if record.has_content() && !is_excluded(&record, &cli.exclude) {
            selected.push(record);
        }
    }

    let show_filename = selected.len() > 1;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for record in &selected {
        if show_filename {
            writeln!(
                out,
                "--- {} ---",
                record.path.as_deref().unwrap_or_default()
            )?;
        }
        write_payload(record, &mut out)?;
    }

    out.flush()?;
    Ok(())
}

/// Whether a `-x` pattern excludes this record's path.
fn is_excluded(record: &DataRecord, patterns: &[String]) -> bool {
    let path = record.path.as_deref().unwrap_or_default();
    patterns
        .iter()
        .any(|x| path.contains(x.as_str()) || glob_match(x, path))
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star matches zero characters, or one and stays for more
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_wildcards() {
        assert!(glob_match("*.plist", "System/Info.plist"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(!glob_match("*.txt", "readme.md"));
    }

    #[test]
    fn exclusion_by_substring_or_glob() {
        let record = DataRecord {
            path: Some("usr/share/doc/readme.txt".into()),
            ..Default::default()
        };
        assert!(is_excluded(&record, &["share/doc".to_string()]));
        assert!(is_excluded(&record, &["*.txt".to_string()]));
        assert!(!is_excluded(&record, &["*.bin".to_string()]));
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
