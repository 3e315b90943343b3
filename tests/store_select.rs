// tests/store_select.rs
use std::collections::HashSet;

use daily_news_digest::store::{Article, NewsDocument, NewsStore, SourceNews};

fn article(n: usize) -> Article {
    Article {
        title: format!("headline {n}"),
        text: format!("body {n}"),
        link: format!("https://example.test/{n}"),
        published: "Mon, 01 Dec 2025 06:00:00 GMT".to_string(),
    }
}

fn doc_with(counts: &[(&str, usize)]) -> NewsDocument {
    let mut next = 0;
    let mut sources = Vec::new();
    for (name, count) in counts {
        let mut articles = Vec::new();
        for _ in 0..*count {
            next += 1;
            articles.push(article(next));
        }
        sources.push((name.to_string(), SourceNews { articles }));
    }
    NewsDocument::from_sources(sources).unwrap()
}

#[test]
fn exactly_ten_selected_in_stable_order() {
    let doc = doc_with(&[("bbc", 6), ("wire", 4), ("local", 5)]);
    let picked = doc.top_articles(10);
    assert_eq!(picked.len(), 10);

    let titles: Vec<_> = picked.iter().map(|a| a.title.clone()).collect();
    let expected: Vec<_> = (1..=10).map(|n| format!("headline {n}")).collect();
    assert_eq!(titles, expected);
}

#[test]
fn fewer_than_ten_selects_all_without_duplicates() {
    let doc = doc_with(&[("bbc", 3), ("wire", 2)]);
    let picked = doc.top_articles(10);
    assert_eq!(picked.len(), 5);

    let links: HashSet<_> = picked.iter().map(|a| a.link.clone()).collect();
    assert_eq!(links.len(), 5);
}

#[test]
fn selection_is_stable_across_calls() {
    let doc = doc_with(&[("bbc", 12)]);
    assert_eq!(doc.top_articles(10), doc.top_articles(10));
}

#[tokio::test]
async fn store_round_trips_through_the_cache_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("output.json");

    let doc = doc_with(&[("bbc", 2), ("wire", 1)]);
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let store = NewsStore::new(&path);
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.top_articles(10), doc.top_articles(10));
}

#[tokio::test]
async fn missing_or_corrupt_cache_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();

    let store = NewsStore::new(tmp.path().join("missing.json"));
    assert!(store.load().await.is_err());

    let corrupt = tmp.path().join("corrupt.json");
    std::fs::write(&corrupt, "{not json").unwrap();
    assert!(NewsStore::new(&corrupt).load().await.is_err());
}
