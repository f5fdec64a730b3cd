use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use strata_core::{DVec3, GroupTopology, TriangleMesh};
use strata_selection::{
    convert_selection, ConversionPolicy, ElementType, GeometrySelection, SelectionId, TopologyType,
};

fn grid(n: u32) -> TriangleMesh {
    let mut positions = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
    for y in 0..=n {
        for x in 0..=n {
            positions.push(DVec3::new(x as f64, y as f64, 0.0));
        }
    }
    let mut tris = Vec::with_capacity((2 * n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            let i = y * (n + 1) + x;
            tris.push([i, i + 1, i + n + 2]);
            tris.push([i, i + n + 2, i + n + 1]);
        }
    }
    // 4x4-quad polygroup tiles
    let groups = (0..n * n)
        .flat_map(|q| {
            let g = (q / n / 4) * n + (q % n) / 4;
            [g, g]
        })
        .collect();
    TriangleMesh::new(positions, &tris)
        .and_then(|m| m.with_polygroups(groups))
        .expect("benchmark grid")
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_selection");
    for n in [32u32, 128] {
        let mesh = grid(n);
        let topo = GroupTopology::new(&mesh);
        let faces = GeometrySelection::with_ids(
            ElementType::Face,
            TopologyType::Triangle,
            mesh.triangle_ids().step_by(3).map(|t| SelectionId::Raw(t.0)),
        );

        group.bench_with_input(BenchmarkId::new("tri_face_to_tri_vertex", n), &n, |b, _| {
            b.iter(|| {
                let mut out = GeometrySelection::new(ElementType::Vertex, TopologyType::Triangle);
                convert_selection(&mesh, None, black_box(&faces), &mut out, ConversionPolicy::Contain).ok();
                out
            })
        });
        group.bench_with_input(BenchmarkId::new("tri_face_to_poly_edge", n), &n, |b, _| {
            b.iter(|| {
                let mut out = GeometrySelection::new(ElementType::Edge, TopologyType::Polygroup);
                convert_selection(&mesh, Some(&topo), black_box(&faces), &mut out, ConversionPolicy::Expand).ok();
                out
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
