// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `pack-rt entries` command: list the raw entries of a package archive.

use super::truncate;
use archive_reader::EntryKind;
use std::path::PathBuf;

pub async fn execute(package: PathBuf) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&package)
        .await
        .map_err(|e| anyhow::anyhow!("cannot read '{}': {e}", package.display()))?;
    let entries = archive_reader::read_entries(&bytes)
        .map_err(|e| anyhow::anyhow!("'{}' is not a valid package archive: {e}", package.display()))?;

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              pack-rt · Archive Entries               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    println!("  {:<5} {:>10} {:>10}  {}", "Kind", "Offset", "Size", "Path");
    println!("  {}", "-".repeat(72));

    let mut files = 0usize;
    let mut total = 0usize;
    for entry in &entries {
        let (kind, offset, size) = match (entry.kind, entry.span) {
            (EntryKind::File, Some(span)) => {
                files += 1;
                total += span.len;
                ("file", span.offset.to_string(), span.len.to_string())
            }
            (EntryKind::File, None) => ("file", "-".into(), "-".into()),
            (EntryKind::Directory, _) => ("dir", "-".into(), "-".into()),
        };
        println!(
            "  {:<5} {:>10} {:>10}  {}",
            kind,
            offset,
            size,
            truncate(&entry.path, 48)
        );
    }

    println!();
    println!(
        "  {} entries, {} files, {:.2} KB of content in {:.2} KB archive",
        entries.len(),
        files,
        total as f64 / 1024.0,
        bytes.len() as f64 / 1024.0,
    );
    println!();
    Ok(())
}
