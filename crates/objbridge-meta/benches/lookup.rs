use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use objbridge_meta::writer::{ClassDef, EncodingDef, FunctionDef, MetaDef, MetadataWriter, MethodDef};
use objbridge_meta::{name_hash, MemberKind, MetaFile, SystemVersion};

/// `classes` interfaces with 32 methods each plus as many functions
fn synthetic_blob(classes: usize, buckets: usize) -> Vec<u8> {
    let mut writer = MetadataWriter::new(buckets);
    for c in 0..classes {
        let mut class = ClassDef::new(MetaDef::new(&format!("Class{}", c)));
        if c > 0 {
            class = class.base(&format!("Class{}", c - 1));
        }
        for m in 0..32 {
            let params = m % 4;
            let selector = format!("method{}{}", m, ":".repeat(params));
            let mut signature = vec![EncodingDef::id()];
            signature.extend(std::iter::repeat(EncodingDef::int()).take(params));
            class = class.instance_method(MethodDef::new(&format!("method{}", m / 4), &selector, signature));
        }
        writer.add_interface(class);
        writer.add_function(FunctionDef::new(
            MetaDef::new(&format!("Function{}", c)),
            vec![EncodingDef::void(), EncodingDef::pointer(EncodingDef::char())],
        ));
    }
    writer.finish()
}

fn bench_find_meta(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_meta");

    for &classes in &[100usize, 1_000, 10_000] {
        let blob = synthetic_blob(classes, classes / 4 + 1);
        let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();
        let table = file.global_table();
        let name = format!("Class{}", classes / 2);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("hit", classes), &name, |b, name| {
            b.iter(|| table.find_meta(black_box(name), true))
        });
        group.bench_with_input(BenchmarkId::new("miss", classes), &"NoSuchClass", |b, name| {
            b.iter(|| table.find_meta(black_box(name), true))
        });

        let hash = name_hash(name.as_bytes());
        group.bench_with_input(BenchmarkId::new("prehashed", classes), &name, |b, name| {
            b.iter(|| table.find_meta_raw(black_box(name.as_bytes()), hash, true))
        });
    }

    group.finish();
}

fn bench_members(c: &mut Criterion) {
    let blob = synthetic_blob(64, 17);
    let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();
    let class = file.global_table().find_interface_meta("Class63").unwrap();

    c.bench_function("members_overloads", |b| {
        b.iter(|| class.members(black_box("method5"), MemberKind::InstanceMethod, true, true))
    });

    c.bench_function("best_method", |b| {
        b.iter(|| class.best_method(black_box("method5"), MemberKind::InstanceMethod, 2, true))
    });

    c.bench_function("ancestors_walk", |b| b.iter(|| class.ancestors().count()));
}

fn bench_iterate(c: &mut Criterion) {
    let blob = synthetic_blob(1_000, 251);
    let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();

    c.bench_function("iterate_global_table", |b| {
        b.iter(|| file.global_table().iter().filter(|e| e.is_available()).count())
    });
}

criterion_group!(benches, bench_find_meta, bench_members, bench_iterate);
criterion_main!(benches);
