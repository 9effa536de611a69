use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kelbow::traits::{Fit, Transformer};
use kelbow::Observations;
use kelbow_preprocessing::StandardScaler;
use ndarray::Array2;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn bench(c: &mut Criterion) {
    let mut benchmark = c.benchmark_group("standard scaler");
    let mut rng = Xoshiro256Plus::seed_from_u64(40);
    let size = 10000;

    for nfeatures in (10..100).step_by(30) {
        let records: Array2<f64> =
            Array2::random_using((size, nfeatures), Uniform::new(-30., 30.), &mut rng);
        let dataset = Observations::from(records);
        benchmark.bench_function(
            BenchmarkId::new("fit_transform", format!("{}x{}", nfeatures, size)),
            |bencher| {
                bencher.iter(|| {
                    let scaler = StandardScaler::params().fit(black_box(&dataset)).unwrap();
                    let _scaled: Array2<f64> =
                        scaler.transform(black_box(dataset.records().clone())).unwrap();
                });
            },
        );
    }
    benchmark.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
