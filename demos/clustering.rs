//! DBSCAN on a simple 2D dataset, with a k-distance profile to pick ε.

use kdscan::{k_distances, Dbscan, KdTree, KdTreeParams, Label, PointSet};

fn main() -> kdscan::Result<()> {
    // Three well-separated groups in 2D plus two outliers.
    let data: Vec<Vec<f64>> = vec![
        // Group A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        // Group B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        // Group C (near (10, 0))
        vec![10.0, 0.0],
        vec![10.1, 0.1],
        vec![9.9, -0.1],
        vec![10.2, 0.2],
        // Outliers
        vec![2.5, 7.5],
        vec![7.5, -4.0],
    ];

    let points = PointSet::from_rows(&data)?;
    let tree = KdTree::build(&points, KdTreeParams::default())?;

    let min_pts = 3;
    println!("=== k-distance profile (k = {min_pts}) ===");
    for (rank, d) in k_distances(&tree, min_pts)?.iter().enumerate() {
        println!("  {rank:2}: {d:.3}");
    }

    let fit = Dbscan::new(1.0, min_pts).run(&points, &tree)?;
    println!("\n=== DBSCAN (eps=1.0, min_pts={min_pts}) ===");
    for (i, label) in fit.labels().iter().enumerate() {
        let tag = match label {
            Label::Noise => "NOISE".to_string(),
            Label::Cluster(k) => format!("cluster {k}"),
        };
        let core = if fit.is_core(i) { "core" } else { "" };
        println!(
            "  point {:2} ({:5.1}, {:5.1}) => {} {}",
            i, data[i][0], data[i][1], tag, core
        );
    }
    println!(
        "\n{} clusters, {} noise points",
        fit.n_clusters(),
        fit.noise_count()
    );
    Ok(())
}
