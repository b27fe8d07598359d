use kdscan::{
    build_index, cluster, range_query, Clustering, Dbscan, Error, KdTreeParams, Label, PointSet,
    RadiusSearch, StopSignal,
};

#[test]
fn three_close_points_and_an_outlier() {
    let points = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![10.0, 10.0]];
    assert_eq!(cluster(&points, 1.5, 2).unwrap(), vec![0, 0, 0, -1]);
}

#[test]
fn exact_duplicates_form_one_cluster() {
    let points = vec![vec![0.0, 0.0]; 3];
    assert_eq!(cluster(&points, 0.01, 3).unwrap(), vec![0, 0, 0]);
}

#[test]
fn empty_input_gives_empty_labels() {
    assert_eq!(cluster(&[], 0.5, 3).unwrap(), Vec::<i64>::new());
}

#[test]
fn negative_epsilon_is_rejected() {
    let points = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
    assert!(matches!(
        cluster(&points, -1.0, 2),
        Err(Error::InvalidParameter { name: "epsilon", .. })
    ));
}

#[test]
fn zero_min_pts_is_rejected() {
    let points = vec![vec![0.0, 0.0]];
    assert!(matches!(
        cluster(&points, 1.0, 0),
        Err(Error::InvalidParameter { name: "min_pts", .. })
    ));
}

#[test]
fn ragged_input_is_rejected() {
    let points = vec![vec![0.0, 0.0], vec![1.0]];
    assert!(matches!(
        cluster(&points, 1.0, 1),
        Err(Error::InvalidDimension { expected: 2, found: 1 })
    ));
}

#[test]
fn range_query_through_the_root_api() {
    let points = PointSet::from_rows(&[
        vec![0.0, 0.0, 0.0],
        vec![1.0, 0.0, 0.0],
        vec![0.0, 2.0, 0.0],
        vec![0.0, 0.0, 0.5],
    ])
    .unwrap();
    let index = build_index(&points, Some(1)).unwrap();

    assert_eq!(range_query(&index, &[0.0, 0.0, 0.0], 1.0).unwrap(), vec![0, 1, 3]);
    assert_eq!(range_query(&index, &[0.0, 0.0, 0.0], 2.0).unwrap(), vec![0, 1, 2, 3]);
    assert!(matches!(
        range_query(&index, &[0.0, 0.0], 1.0),
        Err(Error::InvalidDimension { expected: 3, found: 2 })
    ));
    assert!(matches!(
        range_query(&index, &[0.0, 0.0, 0.0], 0.0),
        Err(Error::InvalidParameter { .. })
    ));
}

#[test]
fn empty_index_answers_every_query_empty() {
    let points = PointSet::empty(2);
    let index = build_index(&points, None).unwrap();
    assert!(range_query(&index, &[1.0, 2.0], 5.0).unwrap().is_empty());
}

#[test]
fn prebuilt_index_is_reusable_across_runs() {
    let rows: Vec<Vec<f64>> = (0..40)
        .map(|i| vec![(i / 10) as f64 * 5.0 + (i % 10) as f64 * 0.1, 0.0])
        .collect();
    let points = PointSet::from_rows(&rows).unwrap();
    let index = build_index(&points, Some(4)).unwrap();

    let fine = Dbscan::new(0.15, 3).run(&points, &index).unwrap();
    assert_eq!(fine.n_clusters(), 4);
    assert_eq!(fine.clusters()[2], (20..30).collect::<Vec<_>>());

    let coarse = Dbscan::new(10.0, 3).run(&points, &index).unwrap();
    assert_eq!(coarse.n_clusters(), 1);
    assert!(coarse.noise().is_empty());
}

#[test]
fn concurrent_runs_share_one_index() {
    let rows: Vec<Vec<f64>> = (0..300)
        .map(|i| {
            let t = i as f64 * 0.05;
            let r = 1.0 + (i % 2) as f64 * 2.0;
            vec![t.cos() * r, t.sin() * r]
        })
        .collect();
    let points = PointSet::from_rows(&rows).unwrap();
    let index = build_index(&points, None).unwrap();
    let expected = Dbscan::new(0.6, 3).run(&points, &index).unwrap();

    let (points, index) = (&points, &index);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || Dbscan::new(0.6, 3).run(points, index).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
    // Inner ring and outer ring.
    assert_eq!(expected.n_clusters(), 2);
}

#[test]
fn cancellation_from_another_thread() {
    let signal = StopSignal::new();
    let remote = signal.clone();
    std::thread::spawn(move || remote.trigger()).join().unwrap();

    let rows = vec![vec![0.0, 0.0]; 10];
    let result = Dbscan::new(1.0, 2).with_stop_signal(signal).fit(&rows);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn index_params_flow_through_fit() {
    let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64, (i * i % 7) as f64]).collect();
    let default = Dbscan::new(1.5, 2).fit_predict(&rows).unwrap();
    let tuned = Dbscan::new(1.5, 2)
        .with_index_params(
            KdTreeParams::new()
                .with_leaf_size(1)
                .with_split_rule(kdscan::SplitRule::Cycle),
        )
        .fit_predict(&rows)
        .unwrap();
    assert_eq!(default, tuned);
    assert!(default.iter().any(|l| *l != Label::Noise));
}

#[test]
fn trait_object_index() {
    let points = PointSet::from_rows(&[vec![0.0], vec![0.5], vec![9.0]]).unwrap();
    let tree = build_index(&points, None).unwrap();
    let index: &dyn RadiusSearch = &tree;
    let fit = Dbscan::new(1.0, 2).run(&points, index).unwrap();
    assert_eq!(fit.raw_labels(), vec![0, 0, -1]);
}
