use aphorize::PosterSettings;
use aphorize::background::{Background, ResolvedBackground};
use aphorize::layout::{compute_layout, wrap_lines};
use aphorize::render::render_svg;
use aphorize::surface::{FixedAdvance, FontMetrics};
use aphorize::theme::PosterTheme;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn quote_of_words(words: usize) -> String {
    const VOCAB: [&str; 8] = [
        "the", "obstacle", "is", "the", "way", "and", "simplicity", "endures",
    ];
    (0..words)
        .map(|idx| VOCAB[idx % VOCAB.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn settings(words: usize) -> PosterSettings {
    let mut settings = PosterSettings::with_quote(quote_of_words(words));
    settings.author = Some("Marcus Aurelius".to_string());
    settings
}

fn bench_wrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrap_lines");
    for words in [8usize, 64, 512] {
        let text = quote_of_words(words);
        group.bench_with_input(BenchmarkId::from_parameter(words), &text, |b, data| {
            b.iter(|| {
                let lines = wrap_lines(black_box(data), 920.0, |line| line.len() as f32 * 24.0);
                black_box(lines.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let theme = PosterTheme::aphorize();
    for words in [8usize, 64, 512] {
        let settings = settings(words);
        group.bench_with_input(BenchmarkId::new("fixed", words), &settings, |b, data| {
            b.iter(|| {
                let layout = compute_layout(black_box(data), &FixedAdvance(24.0), 1080.0, 1080.0, &theme);
                black_box(layout.total_height);
            });
        });
        group.bench_with_input(BenchmarkId::new("font_metrics", words), &settings, |b, data| {
            b.iter(|| {
                let layout = compute_layout(black_box(data), &FontMetrics, 1080.0, 1080.0, &theme);
                black_box(layout.total_height);
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    let theme = PosterTheme::aphorize();
    let backgrounds = [
        ("solid", ResolvedBackground::Fill(Background::solid("#2D3436"))),
        (
            "gradient",
            ResolvedBackground::Fill(Background::from_css(
                "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
            )),
        ),
        ("fallback", ResolvedBackground::Fallback),
    ];
    let settings = settings(64);
    for (name, background) in &backgrounds {
        group.bench_with_input(BenchmarkId::from_parameter(name), background, |b, data| {
            b.iter(|| {
                let svg = render_svg(&settings, black_box(data), None, &theme, 1080.0, 1080.0);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_wrap, bench_layout, bench_render
);
criterion_main!(benches);
