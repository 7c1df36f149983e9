// Search Performance Benchmarks
use blog_search::models::ContentRecord;
use blog_search::search::{
    ExcerptHighlighter, HealthConfig, QuerySanitizer, SearchConfigBuilder, SearchFilters,
    SearchService,
};
use blog_search::state::{create_in_memory_stores, ContentStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;
use tokio::runtime::Runtime;

fn sanitize_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");

    for (name, query) in [
        ("terms", "how to write async rust services"),
        ("phrase", "it's a test (maybe) -- \"quoted\""),
        ("numeric", "20240517"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, query| {
            b.iter(|| QuerySanitizer::sanitize(black_box(query)));
        });
    }
    group.finish();
}

fn excerpt_windows(c: &mut Criterion) {
    let highlighter = ExcerptHighlighter::new(50, "<mark>", "</mark>");
    let mut group = c.benchmark_group("excerpt");

    for paragraphs in [1, 10, 100] {
        let body = "<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>"
            .repeat(paragraphs)
            + "<p>The tokio runtime drives async rust tasks.</p>";

        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &body, |b, body| {
            b.iter(|| highlighter.excerpt(black_box(body), "tokio async rust", 200));
        });
    }
    group.finish();
}

fn search_end_to_end(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();

    let service = rt.block_on(async {
        let config = SearchConfigBuilder::new()
            .index_path(temp_dir.path().join("index"))
            .build();
        let service = SearchService::open(config, HealthConfig::default(), create_in_memory_stores())
            .await
            .unwrap();

        let store = service.content_store();
        for id in 0..500u64 {
            let topic = if id % 5 == 0 { "tokio" } else { "python" };
            let record = ContentRecord::new(
                id,
                format!("Post {} about {}", id, topic),
                format!("<p>Notes on {} and more {} details.</p>", topic, topic),
            )
            .publish();
            store.save_content(&record).await.unwrap();
        }
        service.rebuild_index().await.unwrap();
        service
    });

    c.bench_function("search_first_page", |b| {
        b.to_async(&rt).iter(|| async {
            service
                .search(black_box("tokio"), &SearchFilters::default(), 1, 10)
                .await
        });
    });
}

criterion_group!(benches, sanitize_queries, excerpt_windows, search_end_to_end);
criterion_main!(benches);
