use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use forgemart_attributes::{AttributeCatalog, AttributeDefinition, EnumOption, EnumSpec};
use forgemart_core::AggregateId;
use forgemart_listings::{
    AppendBaseline, AttributeInput, AttributeInputs, GenerationContext, ListingId,
    NormalizeOptions, SkuPrefix, VariantLimits, VariantSet, append_variant_values, cartesian,
    generate_variants, normalize_attributes,
};
use std::collections::BTreeMap;

const AXES: [&str; 3] = ["color", "size", "finish"];

/// Three enum axes with `options` codes each (`v0`, `v1`, …).
fn catalog(options: usize) -> AttributeCatalog {
    let definitions = AXES.iter().enumerate().map(|(i, key)| {
        AttributeDefinition::enumeration(
            *key,
            i as i32,
            EnumSpec {
                parent: None,
                options: (0..options)
                    .map(|o| EnumOption::new(format!("v{o}"), o as i32))
                    .collect(),
            },
        )
        .variant()
    });
    AttributeCatalog::new("bench", definitions).unwrap()
}

fn inputs(per_axis: usize, offset: usize) -> AttributeInputs {
    AXES.iter()
        .map(|key| {
            let codes: Vec<String> = (offset..offset + per_axis).map(|o| format!("v{o}")).collect();
            (key.to_string(), Some(AttributeInput::Options(codes)))
        })
        .collect()
}

fn limits() -> VariantLimits {
    VariantLimits::new(3, 1_000_000)
}

fn ctx() -> GenerationContext {
    GenerationContext {
        sku_cap: limits().sku_cap,
        previous_version: None,
        created_at: Utc::now(),
        default_price: Some(1000),
    }
}

fn bench_cartesian_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("cartesian_expansion");
    let catalog = catalog(20);

    for per_axis in [2usize, 5, 10, 20].iter() {
        let axes = normalize_attributes(
            &catalog,
            &inputs(*per_axis, 0),
            &NormalizeOptions::full_replace(&limits()),
        )
        .unwrap()
        .axes;
        group.throughput(Throughput::Elements(per_axis.pow(3) as u64));
        group.bench_with_input(BenchmarkId::new("three_axes", per_axis), &axes, |b, axes| {
            b.iter(|| black_box(cartesian(black_box(axes))));
        });
    }

    group.finish();
}

fn bench_generate_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_variants");
    let catalog = catalog(20);
    let prefix = SkuPrefix::for_listing(ListingId::new(AggregateId::new()));

    for per_axis in [2usize, 5, 10].iter() {
        let raw = inputs(*per_axis, 0);
        group.throughput(Throughput::Elements(per_axis.pow(3) as u64));
        group.bench_with_input(BenchmarkId::new("normalize_and_generate", per_axis), &raw, |b, raw| {
            b.iter(|| {
                let normalized =
                    normalize_attributes(&catalog, raw, &NormalizeOptions::full_replace(&limits()))
                        .unwrap();
                black_box(generate_variants(&prefix, &normalized.axes, &ctx()).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_variant_values");
    let catalog = catalog(20);
    let prefix = SkuPrefix::for_listing(ListingId::new(AggregateId::new()));
    let headers = BTreeMap::new();

    for per_axis in [2usize, 5, 10].iter() {
        let normalized = normalize_attributes(
            &catalog,
            &inputs(*per_axis, 0),
            &NormalizeOptions::full_replace(&limits()),
        )
        .unwrap();
        let generated = generate_variants(&prefix, &normalized.axes, &ctx()).unwrap();
        let variants = VariantSet::from(generated.variants);
        let mut delta = AttributeInputs::new();
        delta.insert(
            "color".to_string(),
            Some(AttributeInput::options([format!("v{per_axis}")])),
        );

        group.throughput(Throughput::Elements(per_axis.pow(2) as u64));
        group.bench_with_input(BenchmarkId::new("one_new_color", per_axis), &delta, |b, delta| {
            b.iter(|| {
                let baseline = AppendBaseline {
                    is_draft: false,
                    snapshot: Some(&generated.snapshot),
                    variants: &variants,
                    headers: &headers,
                    prefix: &prefix,
                    default_price: Some(1000),
                };
                black_box(
                    append_variant_values(
                        &catalog,
                        baseline,
                        delta,
                        &generated.snapshot.snapshot_id,
                        &limits(),
                        Utc::now(),
                    )
                    .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cartesian_expansion,
    bench_generate_variants,
    bench_append
);
criterion_main!(benches);
