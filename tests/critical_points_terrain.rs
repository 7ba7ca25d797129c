//! Critical-point classification on triangulated synthetic terrains.
//!
//! Each terrain is a 5 x 5 lattice whose centre is a known feature. The
//! lattice is cocircular, so the oracle is free to pick either diagonal in
//! every cell; the centre's classification must not depend on that choice.

use sounding_selection::prelude::*;

fn terrain<F>(depth: F) -> Mesh
where
    F: Fn(f64, f64) -> f64,
{
    let mut vertices = Vec::new();
    for i in 0..5_i32 {
        for j in 0..5_i32 {
            let (x, y) = (f64::from(i - 2), f64::from(j - 2));
            vertices.push(sounding!(x * 100.0, y * 100.0, depth(x, y)));
        }
    }
    let points: Vec<Point> = vertices.iter().map(Vertex::point).collect();
    let raw = SpadeTriangulator
        .triangulate(&TriangulationInput::unconstrained(points))
        .unwrap();
    mesh_from_triangulation(&raw, &vertices).unwrap()
}

fn centre(mesh: &Mesh) -> usize {
    mesh.vertices()
        .iter()
        .position(|v| v.point() == Point::new(0.0, 0.0))
        .unwrap()
}

fn classified(mut mesh: Mesh) -> (Mesh, CriticalCounts) {
    let tree = PrQuadtree::build_mesh(&mesh, 4).unwrap();
    let counts = classify_mesh(&mut mesh, &tree);
    (mesh, counts)
}

#[test]
fn test_bowl_centre_is_a_pit() {
    let mesh = terrain(|x, y| 20.0 - x.mul_add(x, y * y));
    let c = centre(&mesh);
    assert_eq!(classify_vertex(&mesh, c), Classification::Minimum);

    let (mesh, counts) = classified(mesh);
    assert_eq!(mesh.vertices()[c].classification(), Classification::Minimum);
    assert!(counts.minima >= 1);
}

#[test]
fn test_mound_centre_is_a_shoal() {
    let mesh = terrain(|x, y| 1.0 + x.mul_add(x, y * y));
    let c = centre(&mesh);
    assert_eq!(classify_vertex(&mesh, c), Classification::Maximum);

    let (mesh, counts) = classified(mesh);
    assert_eq!(mesh.vertices()[c].classification(), Classification::Maximum);
    assert!(counts.maxima >= 1);
}

#[test]
fn test_pass_centre_is_a_saddle() {
    // Deeper to the east and west, shallower to the north and south.
    let mesh = terrain(|x, y| 10.0 + 2.0 * x * x - y * y);
    let c = centre(&mesh);
    assert_eq!(classify_vertex(&mesh, c), Classification::Saddle);

    let (_, counts) = classified(mesh);
    assert!(counts.saddles >= 1);
}

#[test]
fn test_inclined_plane_has_no_interior_critical_points() {
    let mesh = terrain(|x, y| 10.0 + x + 0.5 * y);
    let c = centre(&mesh);
    assert_eq!(classify_vertex(&mesh, c), Classification::Unclassified);
}

#[test]
fn test_non_critical_vertices_keep_their_tag() {
    let mut mesh = terrain(|x, y| 10.0 + x + 0.5 * y);
    let c = centre(&mesh);
    mesh.vertex_mut(c)
        .unwrap()
        .set_classification(Classification::Selected(SelectionRole::Appended));

    let (mesh, _) = classified(mesh);
    assert_eq!(
        mesh.vertices()[c].classification(),
        Classification::Selected(SelectionRole::Appended)
    );
}
