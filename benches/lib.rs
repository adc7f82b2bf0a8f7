use criterion::{criterion_group, criterion_main};

mod transit;

criterion_group!(benches_bls, bls::bench_bls);
criterion_group!(benches_transit, transit::bench_transit_model);
criterion_group!(benches_sampler, sampler::bench_sampler);
criterion_main!(benches_bls, benches_transit, benches_sampler);
