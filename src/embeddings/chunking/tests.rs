use super::*;

fn config(size: usize, overlap: usize) -> ChunkingConfig {
    ChunkingConfig {
        chunk_size: size,
        chunk_overlap: overlap,
    }
}

fn document(text: &str) -> Document {
    Document::new(text, "notes.txt").with_section("guide")
}

/// Rebuild the source text by dropping the overlapping prefix of every chunk
fn reassemble(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    let mut covered = 0;
    for chunk in chunks {
        let skip = covered - chunk.position;
        text.extend(chunk.text.chars().skip(skip));
        covered = chunk.position + chunk.text.chars().count();
    }
    text
}

#[test]
fn empty_text_has_no_chunks() {
    assert!(split_document(&document(""), &config(10, 2)).is_empty());
    assert_eq!(expected_chunk_count(0, &config(10, 2)), 0);
}

#[test]
fn short_text_is_a_single_chunk() {
    let chunks = split_document(&document("tiny"), &config(10, 2));

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "tiny");
    assert_eq!(chunks[0].position, 0);
}

#[test]
fn windows_overlap_and_advance_by_stride() {
    let text: String = ('a'..='z').collect();
    let chunks = split_document(&document(&text), &config(10, 3));

    assert_eq!(
        chunks.iter().map(|c| c.position).collect::<Vec<_>>(),
        vec![0, 7, 14, 21]
    );
    assert_eq!(chunks[0].text, "abcdefghij");
    assert_eq!(chunks[1].text, "hijklmnopq");
    assert_eq!(chunks[2].text, "opqrstuvwx");
    assert_eq!(chunks[3].text, "vwxyz");
}

#[test]
fn last_chunk_may_be_shorter() {
    let text = "x".repeat(25);
    let chunks = split_document(&document(&text), &config(10, 2));

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].position, 16);
    assert_eq!(chunks[2].text.len(), 9);
}

#[test]
fn chunk_count_matches_formula() {
    for len in [1, 9, 10, 11, 57, 100, 101, 999] {
        let text = "y".repeat(len);
        for (size, overlap) in [(10, 0), (10, 3), (10, 9), (64, 16)] {
            let cfg = config(size, overlap);
            let chunks = split_document(&document(&text), &cfg);
            assert_eq!(
                chunks.len(),
                expected_chunk_count(len, &cfg),
                "len={len} size={size} overlap={overlap}"
            );
        }
    }
}

#[test]
fn chunks_cover_full_text() {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    let chunks = split_document(&document(&text), &config(37, 11));

    assert_eq!(reassemble(&chunks), text);
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].position - pair[0].position, 26);
    }
}

#[test]
fn chunks_inherit_metadata() {
    let text = "z".repeat(50);
    let chunks = split_document(&document(&text), &config(20, 5));

    assert!(chunks.iter().all(|c| c.metadata.origin == "notes.txt"));
    assert!(
        chunks
            .iter()
            .all(|c| c.metadata.section.as_deref() == Some("guide"))
    );
}

#[test]
fn splitting_is_deterministic() {
    let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(40);
    let cfg = config(128, 32);

    assert_eq!(
        split_document(&document(&text), &cfg),
        split_document(&document(&text), &cfg)
    );
}

#[test]
fn multibyte_text_is_split_on_char_boundaries() {
    let text = "héllo wörld ✓ ".repeat(10);
    let chunks = split_document(&document(&text), &config(16, 4));

    assert!(chunks.iter().all(|c| c.text.chars().count() <= 16));
    assert_eq!(reassemble(&chunks), text);
}
