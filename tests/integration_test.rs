// Integration tests for amusic
use amusic::prelude::*;
use amusic::{artifact_path, table_path};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

fn xy_table(rows: Vec<FeatureRow>) -> FeatureTable {
    FeatureTable::new(EntityKind::Song, vec!["x".to_string(), "y".to_string()], rows).unwrap()
}

fn engine(table: FeatureTable) -> RecommendationEngine {
    let index = IndexBuilder::new().build_all(&table).unwrap();
    RecommendationEngine::new(Arc::new(table), Arc::new(index))
}

fn scenario() -> RecommendationEngine {
    engine(xy_table(vec![
        FeatureRow::new("A", "Track", [("x", 1.0), ("y", 0.0)]),
        FeatureRow::new("B", "Other", [("x", 1.0), ("y", 0.01)]),
        FeatureRow::new("C", "Far", [("x", 5.0), ("y", 5.0)]),
        FeatureRow::new("D", "Track", [("x", 1.0), ("y", 0.0)]),
    ]))
}

fn random_engine(rows: usize, seed: u64) -> RecommendationEngine {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..rows)
        .map(|i| {
            let label = format!("label-{}", rng.random_range(0..rows / 2));
            FeatureRow::new(
                i as u64,
                label,
                [("x", rng.random_range(0.0f32..1.0)), ("y", rng.random_range(0.0f32..1.0))],
            )
        })
        .collect();
    engine(xy_table(rows))
}

fn ids(response: &RecommendationResponse) -> Vec<String> {
    response.result.iter().map(|r| r.id().to_string()).collect()
}

#[test]
fn test_seed_and_its_label_filtered() {
    let response = scenario().recommend(&RecommendRequest::new("A", 2)).unwrap();
    assert_eq!(ids(&response), vec!["B", "C"]);
}

#[test]
fn test_shortfall_returns_every_eligible_row() {
    let response = scenario().recommend(&RecommendRequest::new("A", 10)).unwrap();
    assert_eq!(response.result.len(), 2);

    let response = scenario()
        .recommend(&RecommendRequest::new("A", 10).with_diversity(0.0))
        .unwrap();
    assert_eq!(response.result.len(), 3);
    let stats: &RecommendationStats = &response.stats;
    assert_eq!(stats.returned, 3);
    assert!(stats.is_short());
}

#[test]
fn test_unknown_seed() {
    let err = scenario().recommend(&RecommendRequest::new("Z", 3)).unwrap_err();
    assert!(matches!(err, Error::SeedNotFound(_)));
}

#[test]
fn test_single_row_table_cannot_be_indexed() {
    let table = xy_table(vec![FeatureRow::new("A", "Track", [("x", 1.0), ("y", 0.0)])]);
    let err = IndexBuilder::new().build_all(&table).unwrap_err();
    assert!(matches!(err, Error::InsufficientData { rows: 1, required: 2 }));
}

#[test]
fn test_empty_feature_list_rejected() {
    let table = xy_table(vec![
        FeatureRow::new("A", "a", [("x", 1.0), ("y", 0.0)]),
        FeatureRow::new("B", "b", [("x", 2.0), ("y", 0.0)]),
    ]);
    let err = IndexBuilder::new().build(&table, &[]).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_query_shape_mismatch() {
    let engine = scenario();
    let err = engine.index().k_nearest(&[1.0, 2.0, 3.0], 2).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { expected: 2, actual: 3 }));
}

#[test]
fn test_invariants_over_random_tables() {
    let engine = random_engine(200, 7);
    for seed in [0u64, 17, 99, 150] {
        let seed_id = RowId::Integer(seed);
        let seed_label = engine.table().row_by_id(&seed_id).unwrap().label.clone();

        let diverse = engine.recommend(&RecommendRequest::new(seed, 15)).unwrap();
        assert_eq!(diverse.result.len(), 15);
        assert!(diverse.result.iter().all(|r| r.id() != &seed_id));
        let labels: HashSet<&str> = diverse.result.iter().map(|r| r.label()).collect();
        assert_eq!(labels.len(), diverse.result.len());
        assert!(!labels.contains(seed_label.as_str()));

        let plain = engine
            .recommend(&RecommendRequest::new(seed, 15).with_diversity(0.0))
            .unwrap();
        assert_eq!(plain.result.len(), 15);
        assert!(plain.result.iter().all(|r| r.id() != &seed_id));
        assert!(plain.result.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}

#[test]
fn test_queries_are_deterministic() {
    let first = random_engine(300, 42);
    let second = random_engine(300, 42);
    let request = RecommendRequest::new(5u64, 20);
    let a = first.recommend(&request).unwrap();
    let b = first.recommend(&request).unwrap();
    let c = second.recommend(&request).unwrap();
    assert_eq!(a.result, b.result);
    assert_eq!(a.result, c.result);
}

#[test]
fn test_concurrent_queries_share_one_engine() {
    let engine = Arc::new(random_engine(500, 3));
    let expected = engine.recommend(&RecommendRequest::new(1u64, 10)).unwrap().result;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.recommend(&RecommendRequest::new(1u64, 10)).unwrap().result)
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_csv_to_catalog_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv = "\
valence,year,acousticness,artists,danceability,duration_ms,energy,explicit,id,instrumentalness,key,liveness,loudness,mode,name,popularity,release_date,speechiness,tempo
0.1,1990,0.9,['Ann'],0.2,200000,0.1,0,s1,0.0,1,0.1,-20.0,1,Quiet Song,10,1990,0.03,80.0
0.2,1991,0.8,['Ann'],0.3,210000,0.2,0,s2,0.0,2,0.1,-19.0,1,Soft Song,12,1991,0.03,85.0
0.9,2010,0.1,['Bob'],0.9,180000,0.9,1,s3,0.0,3,0.3,-4.0,0,Loud Song,70,2010,0.10,130.0
0.2,1992,0.8,['Cat'],0.3,205000,0.2,0,s4,0.0,2,0.1,-19.5,1,Soft Song,15,1992,0.03,84.0
";
    std::fs::write(table_path(dir.path(), EntityKind::Song), csv).unwrap();

    let mut config = CatalogConfig::new(dir.path());
    config.build_missing = true;
    let catalog = Catalog::open(&config).unwrap();
    assert!(artifact_path(dir.path(), EntityKind::Song).exists());

    let artifact = IndexArtifact::load(artifact_path(dir.path(), EntityKind::Song)).unwrap();
    assert_eq!(artifact.info.rows, 4);
    assert_eq!(artifact.info.feature_names.len(), 10);

    let engine = catalog.engine(EntityKind::Song).unwrap();
    let response = engine.recommend_by_label("Quiet Song", 2, None).unwrap();
    let labels: Vec<&str> = response.result.iter().map(|r| r.label()).collect();
    assert_eq!(labels, vec!["Soft Song", "Loud Song"]);
    assert_eq!(response.result[0].id(), &RowId::from("s4"));
    assert_eq!(response.result[0].row.attribute("artists"), Some("['Cat']"));
}
