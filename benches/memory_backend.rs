use criterion::{black_box, criterion_group, criterion_main, Criterion};
use regkey::{ops, Access, ExpandMode, KeyOptions, MemoryBackend, RegKey, RootKey};

fn bench_values(c: &mut Criterion) {
    let backend = MemoryBackend::new();
    backend.set_env("BENCH_HOME", "C:\\Users\\bench");
    let (key, _) =
        RegKey::create_with(backend, RootKey::CurrentUser, "Bench/Values", KeyOptions::write())
            .unwrap();
    key.set_dword("Version", 3).unwrap();
    key.set_string("Name", "registry value benchmark").unwrap();
    key.set_expand_string("Path", "%BENCH_HOME%\\bin").unwrap();
    let list: Vec<String> = (0..32).map(|i| format!("entry-{}", i)).collect();
    key.set_multi_string("List", &list).unwrap();

    let mut group = c.benchmark_group("values");

    group.bench_function("get_dword", |b| {
        b.iter(|| black_box(key.get_dword("Version").unwrap()));
    });

    group.bench_function("get_string", |b| {
        b.iter(|| black_box(key.get_string("Name").unwrap()));
    });

    group.bench_function("get_expand_string", |b| {
        b.iter(|| black_box(key.get_expand_string("Path", ExpandMode::Expand).unwrap()));
    });

    group.bench_function("get_multi_string_32", |b| {
        b.iter(|| black_box(key.get_multi_string("List").unwrap()));
    });

    group.bench_function("set_string", |b| {
        b.iter(|| key.set_string("Scratch", black_box("some text")).unwrap());
    });

    group.finish();
}

fn bench_enumeration(c: &mut Criterion) {
    let backend = MemoryBackend::new();
    let (key, _) =
        RegKey::create_with(backend, RootKey::CurrentUser, "Bench/Enum", KeyOptions::write())
            .unwrap();
    for i in 0..256 {
        key.create_sub_key(&format!("Child{:03}", i), KeyOptions::write())
            .unwrap();
        key.set_dword(&format!("Value{:03}", i), i).unwrap();
    }

    let mut group = c.benchmark_group("enumeration");

    group.bench_function("enum_sub_keys_256", |b| {
        b.iter(|| black_box(key.enum_sub_keys().unwrap()));
    });

    group.bench_function("enum_values_256", |b| {
        b.iter(|| black_box(key.enum_values().unwrap()));
    });

    group.finish();
}

fn bench_one_shot(c: &mut Criterion) {
    let backend = MemoryBackend::new();
    ops::set(&backend, RootKey::CurrentUser, "Bench/Ops", "Version", 3u32, Access(0)).unwrap();

    c.bench_function("ops_query_dword", |b| {
        b.iter(|| {
            black_box(
                ops::query(&backend, RootKey::CurrentUser, "Bench/Ops", "Version", Access(0))
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_values, bench_enumeration, bench_one_shot);
criterion_main!(benches);
