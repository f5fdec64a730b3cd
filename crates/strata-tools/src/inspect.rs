//! `strata inspect`: read an asset and report what came out of it.

use std::fmt::Write as _;

use serde_json::{json, Value};
use strata_gltf::asset::NodeKind;
use strata_gltf::{Asset, FileReader, ReadOptions, ReadOutcome};

use crate::cli::InspectArgs;
use crate::error::Result;

/// Prints the report and returns whether the read succeeded.
#[tracing::instrument(skip_all, fields(file = %args.file.display()))]
pub fn run(args: &InspectArgs) -> Result<bool> {
    let reader = FileReader::with_options(ReadOptions {
        load_image_data: args.load_image_data,
        load_metadata: args.load_metadata,
        ..Default::default()
    });
    let outcome = reader.read_file(&args.file);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report(&outcome))?);
    } else {
        print!("{}", render(&outcome));
    }
    Ok(outcome.is_success())
}

fn messages(outcome: &ReadOutcome) -> Vec<Value> {
    outcome
        .messages
        .iter()
        .map(|m| json!({ "severity": m.severity.to_string(), "text": m.text }))
        .collect()
}

fn count_kind(asset: &Asset, kind: NodeKind) -> usize {
    asset.nodes.iter().filter(|node| node.kind == kind).count()
}

fn asset_report(asset: &Asset) -> Value {
    let (supported, unsupported) = asset.extensions_used_split();
    let processed: Vec<&str> = asset.processed_extensions.iter().map(|ext| ext.name()).collect();
    json!({
        "name": asset.name,
        "scenes": asset.scenes.len(),
        "defaultScene": asset.default_scene,
        "nodes": {
            "total": asset.nodes.len(),
            "joints": count_kind(asset, NodeKind::Joint),
            "proxyRoots": asset.nodes.iter().filter(|node| node.is_proxy_root).count(),
            "meshes": count_kind(asset, NodeKind::Mesh) + count_kind(asset, NodeKind::MeshSkinned),
            "orphans": asset.orphan_nodes().len(),
        },
        "meshes": asset.meshes.len(),
        "primitives": asset.meshes.iter().map(|mesh| mesh.primitives.len()).sum::<usize>(),
        "accessors": asset.accessors.len(),
        "skins": asset.skins.len(),
        "animations": asset.animations.len(),
        "cameras": asset.cameras.len(),
        "lights": asset.lights.len() + asset.ies_lights.len(),
        "materials": asset.materials.len(),
        "textures": asset.textures.len(),
        "images": asset.images.len(),
        "arenaBytes": asset.arena.len(),
        "abnormalInverseBindMatrices": asset.has_abnormal_inverse_bind_matrices,
        "extensions": {
            "supported": supported,
            "unsupported": unsupported,
            "processed": processed,
        },
    })
}

pub fn report(outcome: &ReadOutcome) -> Value {
    json!({
        "success": outcome.is_success(),
        "generator": outcome.metadata.generator_name,
        "version": outcome.metadata.version,
        "extras": outcome
            .metadata
            .extras
            .iter()
            .map(|extra| (extra.name.clone(), Value::from(extra.value.clone())))
            .collect::<serde_json::Map<_, _>>(),
        "asset": outcome.asset.as_ref().map(asset_report),
        "messages": messages(outcome),
    })
}

pub fn render(outcome: &ReadOutcome) -> String {
    let mut out = String::new();
    let metadata = &outcome.metadata;
    let _ = writeln!(out, "generator: {}", metadata.generator_name);
    let _ = writeln!(out, "version:   {:.1}", metadata.version);
    for extra in &metadata.extras {
        let _ = writeln!(out, "extra:     {} = {}", extra.name, extra.value);
    }

    match &outcome.asset {
        Some(asset) => {
            let meshes = asset.meshes.len();
            let primitives: usize = asset.meshes.iter().map(|mesh| mesh.primitives.len()).sum();
            let _ = writeln!(out, "asset:     {}", asset.name);
            let _ = writeln!(out, "scenes:    {}", asset.scenes.len());
            let _ = writeln!(
                out,
                "nodes:     {} ({} joints, {} proxy roots)",
                asset.nodes.len(),
                count_kind(asset, NodeKind::Joint),
                asset.nodes.iter().filter(|node| node.is_proxy_root).count()
            );
            let _ = writeln!(out, "meshes:    {} ({} primitives)", meshes, primitives);
            let _ = writeln!(out, "skins:     {}", asset.skins.len());
            let _ = writeln!(out, "animations: {}", asset.animations.len());
            let _ = writeln!(out, "materials: {}", asset.materials.len());
            let _ = writeln!(out, "textures:  {}", asset.textures.len());
            let (supported, unsupported) = asset.extensions_used_split();
            if !supported.is_empty() {
                let _ = writeln!(out, "extensions: {}", supported.join(", "));
            }
            if !unsupported.is_empty() {
                let _ = writeln!(out, "unsupported extensions: {}", unsupported.join(", "));
            }
        }
        None => {
            let _ = writeln!(out, "import failed");
        }
    }

    for message in outcome.messages.iter() {
        let _ = writeln!(out, "[{}] {}", message.severity, message.text);
    }
    out
}
