//! Main entry point for the asarfs CLI application.
//!
//! This binary lists and extracts entries of an ASAR archive.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use asarfs::{Archive, Cli, FileEntry};

/// Application entry point.
///
/// Parses command-line arguments, opens the archive and dispatches to
/// listing or extraction.
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let archive = cli
        .open_options()
        .open(&cli.file)
        .with_context(|| format!("failed to read archive {}", cli.file))?;

    let result = process_archive(&archive, &cli);
    archive.close();
    result
}

/// Process an archive based on CLI options.
///
/// - List mode (`-l` or `-v`): display archive contents
/// - Extract mode: extract files matching the specified filters
fn process_archive(archive: &Archive, cli: &Cli) -> Result<()> {
    let selected = select_files(archive, cli);

    if cli.list || cli.verbose {
        list_files(&selected, cli.verbose)
    } else {
        let multiple_files = cli.pipe && selected.len() > 1;
        for entry in &selected {
            extract_file(entry, cli, multiple_files)?;
        }
        Ok(())
    }
}

/// Collect every file entry that passes the positional, extension and
/// exclusion filters, in walk order.
fn select_files<'a>(archive: &'a Archive, cli: &Cli) -> Vec<FileEntry<'a>> {
    let ext = cli
        .extension
        .as_deref()
        .map(|e| e.strip_prefix('.').unwrap_or(e));

    archive
        .root()
        .walk_files()
        .filter(|e| {
            let path = e.path();

            if let Some(ext) = ext {
                let matches = Path::new(e.name())
                    .extension()
                    .is_some_and(|x| x == ext);
                if !matches {
                    return false;
                }
            }

            // Positional arguments: exact path, basename, or glob
            if !cli.files.is_empty() {
                let matches = cli.files.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(f, &path)
                    } else {
                        path == f.replace('\\', "/") || e.name() == f
                    }
                });
                if !matches {
                    return false;
                }
            }

            !cli
                .exclude
                .iter()
                .any(|x| path.contains(x.as_str()) || glob_match(x, &path))
        })
        .collect()
}

/// List files in the archive.
///
/// - Simple format (`-l`): archive paths, one per line
/// - Verbose format (`-v`): table with size, absolute offset and flags
fn list_files(entries: &[FileEntry<'_>], verbose: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if verbose {
        writeln!(out, "{:>12}  {:>12}  {:>4}  Name", "Length", "Offset", "Exec")?;
        writeln!(out, "{}", "-".repeat(60))?;
    }

    let mut total = 0u64;

    for entry in entries {
        if verbose {
            let offset = entry.absolute_offset()?;
            let exec = if entry.is_executable() { "x" } else { "-" };
            writeln!(
                out,
                "{:>12}  {:>12}  {:>4}  {}",
                entry.size(),
                offset,
                exec,
                entry.path()
            )?;
            total += entry.size();
        } else {
            writeln!(out, "{}", entry.path())?;
        }
    }

    if verbose {
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(
            out,
            "{:>12}  {:>12}  {:>4}  {} files ({})",
            total,
            "",
            "",
            entries.len(),
            format_size(total)
        )?;
    }

    Ok(())
}

/// Extract a single file from the archive.
///
/// Handles:
/// - Pipe mode (`-p`): write to stdout instead of a file
/// - Custom output directory (`-d`)
/// - Junk paths (`-j`): ignore directory structure in the archive
/// - Overwrite control (`-n`, `-o`)
fn extract_file(entry: &FileEntry<'_>, cli: &Cli, show_filename: bool) -> Result<()> {
    let archive_path = entry.path();

    if cli.pipe {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if show_filename {
            writeln!(out, "--- {} ---", archive_path)?;
        }
        let mut stream = entry.open_read_stream()?;
        io::copy(&mut stream, &mut out)
            .with_context(|| format!("failed to read {archive_path}"))?;
        return Ok(());
    }

    let relative = if cli.junk_paths {
        junked_name(entry.name())
    } else {
        safe_relative_path(&archive_path)
    };
    let Some(relative) = relative else {
        if !cli.is_very_quiet() {
            warn!(path = %archive_path, "skipping entry that escapes the output directory");
        }
        return Ok(());
    };

    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(&relative),
        None => relative,
    };

    // Handle existing files based on overwrite options
    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", archive_path);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", archive_path);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", archive_path);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut stream = entry.open_read_stream()?;
    let mut file = fs::File::create(&output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    io::copy(&mut stream, &mut file).with_context(|| format!("failed to extract {archive_path}"))?;

    Ok(())
}

/// Turn an archive path into a relative filesystem path, refusing anything
/// that could land outside the output directory.
fn safe_relative_path(archive_path: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();

    for segment in archive_path.split(['/', '\\']) {
        let component = Path::new(segment).components().next();
        match component {
            Some(Component::Normal(name)) if Path::new(segment).components().count() == 1 => {
                out.push(name)
            }
            _ => return None,
        }
    }

    Some(out)
}

/// Output name for junk-paths mode: the entry name itself, accepted only if
/// it is a single plain path component.
fn junked_name(name: &str) -> Option<PathBuf> {
    if name.contains(['/', '\\']) {
        return None;
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(file)), None) => Some(PathBuf::from(file)),
        _ => None,
    }
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
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
            // Star: skip it, or consume one character and keep it
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
    fn glob() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("data/*/a?.ks", "data/scenario/a1.ks"));
        assert!(!glob_match("*.txt", "readme.md"));
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    #[test]
    fn relative_paths() {
        assert_eq!(
            safe_relative_path("data/scenario/cg.ks"),
            Some(PathBuf::from("data").join("scenario").join("cg.ks"))
        );
        assert_eq!(safe_relative_path("../evil"), None);
        assert_eq!(safe_relative_path("a/../../evil"), None);
        assert_eq!(safe_relative_path("a//b"), None);
        assert_eq!(safe_relative_path("."), None);
    }

    #[test]
    fn junked_names() {
        assert_eq!(junked_name("cg.ks"), Some(PathBuf::from("cg.ks")));
        assert_eq!(junked_name("../x"), None);
        assert_eq!(junked_name("/abs"), None);
        assert_eq!(junked_name("a/../../x"), None);
        assert_eq!(junked_name(r"..\x"), None);
        assert_eq!(junked_name(".."), None);
        assert_eq!(junked_name("."), None);
        assert_eq!(junked_name(""), None);
    }
}
