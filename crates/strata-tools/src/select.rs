//! `strata select`: run a selection conversion on the triangles of one primitive.

use serde_json::{json, Value};
use strata_core::{GroupTopology, TriangleMesh};
use strata_gltf::{Asset, FileReader};
use strata_selection::{
    convert_index_array_to_selection, convert_selection_to_index_array, expand_contract_selection, ConnectionMode,
    GeometrySelection, IndexArrayKind, SelectionId, TopologyType,
};

use crate::cli::SelectArgs;
use crate::error::{Result, ToolError};

#[tracing::instrument(skip_all, fields(file = %args.file.display(), mesh = args.mesh, primitive = args.primitive))]
pub fn run(args: &SelectArgs) -> Result<()> {
    let asset = FileReader::new().load(&args.file)?;
    let mesh = primitive_mesh(&asset, args.mesh, args.primitive, args.group_size)?;
    let output = select(&mesh, args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Triangle mesh of one primitive, in the converted frame, with every
/// `group_size` consecutive triangles forming a polygroup.
pub fn primitive_mesh(asset: &Asset, mesh: usize, primitive: usize, group_size: u32) -> Result<TriangleMesh> {
    let source = asset
        .meshes
        .get(mesh)
        .and_then(|m| m.primitives.get(primitive))
        .ok_or(ToolError::MissingPrimitive { mesh, primitive })?;
    let missing = || ToolError::NoTriangles { mesh, primitive };
    let positions = source.positions(asset).ok_or_else(missing)?;
    let triangles = source.triangles(asset).ok_or_else(missing)?;

    let group_size = group_size.max(1);
    let groups = (0..triangles.len() as u32).map(|t| t / group_size).collect();
    let positions = positions.into_iter().map(|p| p.as_dvec3()).collect();
    tracing::debug!(triangles = triangles.len(), "primitive mesh built");
    Ok(TriangleMesh::new(positions, &triangles)?.with_polygroups(groups)?)
}

fn id_json(id: SelectionId) -> Value {
    match id {
        SelectionId::Raw(raw) => json!(raw),
        SelectionId::Grouped { seed, group } => json!({ "seed": seed, "group": group }),
    }
}

pub fn select(mesh: &TriangleMesh, args: &SelectArgs) -> Result<Value> {
    let topology_type = TopologyType::from(args.topology);
    let topology = match topology_type {
        TopologyType::Polygroup => Some(GroupTopology::new(mesh)),
        TopologyType::Triangle => None,
    };
    let topology = topology.as_ref();

    let mut selection = GeometrySelection::new(args.to.into(), topology_type);
    let converted = convert_index_array_to_selection(
        mesh,
        topology,
        &args.indices,
        args.from.into(),
        &mut selection,
        args.policy.into(),
    )?;

    let rings = args.expand.map(|n| (n, false)).or(args.contract.map(|n| (n, true)));
    if let Some((iterations, contract)) = rings {
        selection =
            expand_contract_selection(mesh, topology, &selection, iterations, contract, ConnectionMode::Geometric)?;
    }

    Ok(json!({
        "converted": converted,
        "topology": format!("{:?}", selection.topology_type),
        "element": format!("{:?}", selection.element_type),
        "count": selection.len(),
        "ids": selection.iter().map(id_json).collect::<Vec<_>>(),
        "triangles": convert_selection_to_index_array(mesh, topology, &selection, IndexArrayKind::Triangles)?,
        "vertices": convert_selection_to_index_array(mesh, topology, &selection, IndexArrayKind::Vertices)?,
        "polygroups": convert_selection_to_index_array(mesh, topology, &selection, IndexArrayKind::Polygroups)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ElementArg, IndexKindArg, PolicyArg, TopologyArg};
    use glam::DVec3;

    /// 2x1 quad strip: four triangles, two quads.
    fn strip() -> TriangleMesh {
        let positions = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
        ];
        TriangleMesh::new(positions, &[[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]])
            .unwrap()
            .with_polygroups(vec![0, 0, 1, 1])
            .unwrap()
    }

    fn args(indices: Vec<u32>) -> SelectArgs {
        SelectArgs {
            file: "unused.gltf".into(),
            mesh: 0,
            primitive: 0,
            from: IndexKindArg::Triangles,
            indices,
            to: ElementArg::Face,
            topology: TopologyArg::Triangle,
            policy: PolicyArg::Contain,
            group_size: 2,
            expand: None,
            contract: None,
        }
    }

    #[test]
    fn test_triangle_indices_round_trip() {
        let output = select(&strip(), &args(vec![1, 2])).unwrap();
        assert_eq!(output["triangles"], json!([1, 2]));
        assert_eq!(output["count"], 2);
    }

    #[test]
    fn test_polygroup_face_covers_whole_group() {
        let mut args = args(vec![0]);
        args.topology = TopologyArg::Polygroup;
        let output = select(&strip(), &args).unwrap();
        assert_eq!(output["triangles"], json!([0, 1]));
        assert_eq!(output["polygroups"], json!([0]));
    }

    #[test]
    fn test_expand_grows_to_neighbours() {
        let mut args = args(vec![0]);
        args.expand = Some(1);
        let output = select(&strip(), &args).unwrap();
        assert_eq!(output["triangles"], json!([0, 1, 2, 3]));
    }
}
