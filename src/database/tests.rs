use super::*;
use crate::documents::Document;
use crate::embeddings::{ChunkingConfig, split_document};

#[test]
fn distance_metric_parses_lowercase() {
    #[derive(Deserialize)]
    struct Wrapper {
        distance: DistanceMetric,
    }

    let parsed: Wrapper = toml::from_str("distance = \"cosine\"").expect("should parse");
    assert_eq!(parsed.distance, DistanceMetric::Cosine);

    let parsed: Wrapper = toml::from_str("distance = \"dot\"").expect("should parse");
    assert_eq!(parsed.distance, DistanceMetric::Dot);

    assert!(toml::from_str::<Wrapper>("distance = \"Euclid\"").is_err());
}

#[test]
fn l2_is_squared_euclidean() {
    let distance = DistanceMetric::L2.distance(&[0.0, 0.0], &[3.0, 4.0]);
    assert!((distance - 25.0).abs() < f32::EPSILON);
}

#[test]
fn cosine_ignores_magnitude() {
    let same = DistanceMetric::Cosine.distance(&[1.0, 1.0], &[5.0, 5.0]);
    let orthogonal = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[0.0, 2.0]);

    assert!(same.abs() < 1e-6);
    assert!((orthogonal - 1.0).abs() < 1e-6);
    assert!((DistanceMetric::Cosine.distance(&[0.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
}

#[test]
fn dot_prefers_aligned_vectors() {
    let aligned = DistanceMetric::Dot.distance(&[1.0, 0.0], &[1.0, 0.0]);
    let opposite = DistanceMetric::Dot.distance(&[1.0, 0.0], &[-1.0, 0.0]);
    assert!(aligned < opposite);
}

#[test]
fn record_copies_chunk_metadata() {
    let document = Document::new("x".repeat(1500), "https://example.com/docs/a")
        .with_section("docs");
    let chunks = split_document(&document, &ChunkingConfig::default());

    let record = VectorRecord::from_chunk(&chunks[1], vec![0.5; 4]);

    assert_eq!(record.origin, "https://example.com/docs/a");
    assert_eq!(record.section.as_deref(), Some("docs"));
    assert_eq!(record.position, 900);
    assert_eq!(record.text, chunks[1].text);
    assert!(uuid::Uuid::parse_str(&record.id).is_ok());
    assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());
}
