use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feature_discovery_detector::selector::shortening_candidates;
use feature_discovery_detector::{
    generate_selector, is_valid_selector, optimize_selector, ElementInfo,
};
use feature_discovery_driver::{Driver, NodeFixture, PageFixture, StaticDriver};

/// Elements exercising each generation tier.
fn sample_elements() -> Vec<(&'static str, ElementInfo)> {
    vec![
        (
            "test_id",
            ElementInfo::new("button").attr("data-testid", "submit"),
        ),
        ("id", ElementInfo::new("input").attr("id", "email")),
        (
            "class",
            ElementInfo::new("div").attr("class", "card css-1a2b3c active shadow"),
        ),
        ("attribute", ElementInfo::new("a").attr("href", "/docs/getting-started")),
        ("tag", ElementInfo::new("section")),
    ]
}

/// Page with `width` cards of three buttons each.
fn create_driver(width: usize) -> StaticDriver {
    let mut main = NodeFixture::new("main").attr("id", "app");
    for i in 0..width {
        let mut card = NodeFixture::new("div").attr("class", "card");
        for j in 0..3 {
            card = card.child(
                NodeFixture::new("button")
                    .attr("data-testid", format!("b-{i}-{j}"))
                    .text(format!("Button {i}.{j}")),
            );
        }
        main = main.child(card);
    }
    StaticDriver::with_page("http://localhost/", PageFixture::new("Bench").node(main))
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_selector");
    for (tier, element) in sample_elements() {
        group.bench_with_input(BenchmarkId::from_parameter(tier), &element, |b, element| {
            b.iter(|| generate_selector(black_box(Some(element))));
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let selectors = [
        "#main",
        "nav > ul li:nth-child(2) a[href^=\"/docs\"]",
        "input:not([type=\"hidden\"]), textarea, select",
        "##bad",
        "[unbalanced",
    ];
    c.bench_function("is_valid_selector", |b| {
        b.iter(|| {
            for selector in &selectors {
                black_box(is_valid_selector(Some(black_box(selector))));
            }
        });
    });
}

fn bench_candidates(c: &mut Criterion) {
    c.bench_function("shortening_candidates", |b| {
        b.iter(|| {
            shortening_candidates(black_box(
                "html > body > main#app > div.card > button.primary",
            ))
        });
    });
}

fn bench_optimize(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("optimize_selector");
    for width in [10, 50, 100] {
        let driver = create_driver(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &driver, |b, driver| {
            b.iter(|| {
                runtime.block_on(optimize_selector(
                    black_box("main#app > div.card > [data-testid=\"b-3-1\"]"),
                    Some(driver as &dyn Driver),
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generate,
    bench_validate,
    bench_candidates,
    bench_optimize
);
criterion_main!(benches);
