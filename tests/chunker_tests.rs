use assistant_backend::services::chunker::{CHUNK_WORDS, chunk_pages};

fn page_of_words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

#[test]
fn test_rejoin_is_lossless() {
    let pages = vec![page_of_words(450), page_of_words(10), page_of_words(200)];
    let chunks = chunk_pages(&pages);

    let original: Vec<String> = pages
        .iter()
        .flat_map(|p| p.split_whitespace().map(str::to_string))
        .collect();
    let rejoined: Vec<String> = chunks
        .iter()
        .flat_map(|c| c.split_whitespace().map(str::to_string))
        .collect();

    assert_eq!(original, rejoined);
}

#[test]
fn test_no_empty_chunks() {
    let pages = vec![
        String::new(),
        "   \t\n  ".to_string(),
        page_of_words(1),
        String::new(),
    ];
    let chunks = chunk_pages(&pages);
    assert_eq!(chunks.len(), 1);
    assert!(chunks.iter().all(|c| !c.is_empty()));
}

#[test]
fn test_250_word_pages_give_two_chunks_each() {
    // 3 pages x 250 words with a 200-word window: 200 + 50 per page.
    let pages = vec![page_of_words(250), page_of_words(250), page_of_words(250)];
    let chunks = chunk_pages(&pages);

    assert_eq!(chunks.len(), 6);
    for pair in chunks.chunks(2) {
        assert_eq!(pair[0].split_whitespace().count(), CHUNK_WORDS);
        assert_eq!(pair[1].split_whitespace().count(), 50);
    }
}

#[test]
fn test_exact_window_is_single_chunk() {
    let pages = vec![page_of_words(CHUNK_WORDS)];
    let chunks = chunk_pages(&pages);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].split_whitespace().count(), CHUNK_WORDS);
}
