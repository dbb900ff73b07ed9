// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `pack-rt inspect` command: display an assembled package.
//!
//! Loads the package exactly as the runtime would (patches applied,
//! metadata collected) without instantiating any operator, then checks the
//! topology's wiring and prints the order its nodes would run in.

use super::truncate;
use package_ir::TensorDecl;
use runtime::{OperatorRegistry, PackageHandle, RuntimeConfig};
use std::path::PathBuf;

pub async fn execute(package: PathBuf, config: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => RuntimeConfig::from_file(&path)?,
        None => RuntimeConfig::default(),
    };
    let mut handle = PackageHandle::from_path(&package, OperatorRegistry::new(), config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load package '{}': {e}", package.display()))?;
    let manifest = handle.manifest();

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        handle.release();
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              pack-rt · Package Inspector             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Summary ────────────────────────────────────────────────
    println!("  Package:  {} v{}", manifest.name, manifest.version);
    if !manifest.description.is_empty() {
        println!("  About:    {}", manifest.description);
    }
    println!("  Variant:  {}", manifest.variant);
    if !manifest.producer_name.is_empty() {
        println!(
            "  Producer: {} {}",
            manifest.producer_name, manifest.producer_version
        );
    }
    println!("  Files:    {}", handle.files().paths()?.len());
    println!("  Metadata: {} entries", handle.metadata().len());
    if !handle.dtypes().is_empty() {
        let names: Vec<&str> = handle.dtypes().keys().map(String::as_str).collect();
        println!("  DTypes:   {}", names.join(", "));
    }
    if let Some(dir) = handle.scratch_dir() {
        println!("  Scratch:  {}", dir.display());
    }
    println!();

    // ── Interface ──────────────────────────────────────────────
    print_decls("Inputs", &manifest.inputs);
    print_decls("Outputs", &manifest.outputs);
    if !manifest.dynamic_attributes.is_empty() {
        println!("  Dynamic attributes:");
        for attr in &manifest.dynamic_attributes {
            println!(
                "   {:<24} {:<7} {}",
                truncate(&attr.name, 24),
                attr.content_type.as_str(),
                attr.dtype.as_deref().unwrap_or("-")
            );
        }
        println!();
    }
    if !manifest.env_vars.is_empty() {
        println!("  Environment:");
        for var in &manifest.env_vars {
            println!("   {:<24} {}", truncate(&var.name, 24), var.description);
        }
        println!();
    }

    // ── Operators ──────────────────────────────────────────────
    println!("  Operator instances:");
    for op in handle.operator_configs() {
        println!("   {}", op.summary());
    }
    println!();

    // ── Topology ───────────────────────────────────────────────
    let topology = handle.topology();
    println!("  {:<4} {:<20} {:<28} {}", "Node", "Operator", "Reads", "Writes");
    println!("  {}", "-".repeat(76));
    for (i, node) in topology.nodes.iter().enumerate() {
        println!(
            "  {:<4} {:<20} {:<28} {}",
            i,
            truncate(&node.op_instance_id, 20),
            truncate(&node.inputs.join(", "), 28),
            node.outputs.join(", ")
        );
    }
    println!();

    let wiring = topology
        .validate_wiring(handle.operator_configs(), manifest.input_names())
        .and_then(|()| topology.schedule(manifest.input_names()));
    match wiring {
        Ok(order) => {
            let order: Vec<String> = order.iter().map(|i| i.to_string()).collect();
            println!("  Execution order: {}", order.join(" → "));
        }
        Err(e) => println!("  WARNING: topology cannot run: {e}"),
    }
    println!();

    handle.release();
    Ok(())
}

fn print_decls(title: &str, decls: &[TensorDecl]) {
    println!("  {title}:");
    for decl in decls {
        println!(
            "   {:<24} {:<7} {:<10} {}",
            truncate(&decl.name, 24),
            decl.content_type.as_str(),
            decl.dtype,
            decl.shape
        );
    }
    println!();
}
