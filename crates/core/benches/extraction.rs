use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use echoscape_core::{
    Cleaner, Document, ExtractConfig, LexiconAnalyzer, Pipeline, PipelineConfig, SanitizeConfig, extract_content,
    sanitize_html,
};

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let small = fixture("thin_shell.html");
    let medium = fixture("news_article.html");

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "thin_shell"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "news_article"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_sanitize(c: &mut Criterion) {
    let html = fixture("news_article.html");
    let config = SanitizeConfig::default();

    c.bench_function("sanitize", |b| b.iter(|| sanitize_html(black_box(&html), &config)));
}

fn bench_waterfall(c: &mut Criterion) {
    let config = ExtractConfig::default();
    let mut group = c.benchmark_group("waterfall");

    for name in ["news_article.html", "density_only.html", "thin_shell.html"] {
        let doc = Document::parse(&fixture(name)).unwrap().sanitize(&SanitizeConfig::default());
        group.bench_with_input(BenchmarkId::from_parameter(name), &doc, |b, doc| {
            b.iter(|| extract_content(black_box(doc), black_box(&config)))
        });
    }

    group.finish();
}

fn bench_clean(c: &mut Criterion) {
    let cleaner = Cleaner::default();
    let text = Document::parse(&fixture("news_article.html")).unwrap().text_content();

    c.bench_function("clean", |b| b.iter(|| cleaner.clean(black_box(&text))));
}

fn bench_full_extraction(c: &mut Criterion) {
    let html = fixture("news_article.html");
    let pipeline = Pipeline::with_config(PipelineConfig::builder().render_fallback(false).build()).unwrap();

    c.bench_function("full_extraction", |b| {
        b.iter(|| pipeline.extract_from_html(black_box(&html), Some("https://harborgazette.example/transit")))
    });
}

fn bench_lexicon(c: &mut Criterion) {
    let analyzer = LexiconAnalyzer::default();
    let text = fixture("rendered_story.html");

    c.bench_function("lexicon_sentiment", |b| b.iter(|| analyzer.sentiment(black_box(&text))));
    c.bench_function("lexicon_keywords", |b| b.iter(|| analyzer.keywords(black_box(&text))));
}

criterion_group!(
    benches,
    bench_parse,
    bench_sanitize,
    bench_waterfall,
    bench_clean,
    bench_full_extraction,
    bench_lexicon
);
criterion_main!(benches);
