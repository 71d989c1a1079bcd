//! Public-key operation benchmarks
//!
//! Measures the per-call cost of the engine's hot paths:
//! - RSA PKCS#1 v1.5 sign and verify at several modulus sizes
//! - DSA 1024/160 sign and verify
//! - Packing a private key

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cryptoplane_core::{AlgorithmId, EngineConfig};
use cryptoplane_pk::hash::hash_memory;
use cryptoplane_pk::{
    pack_to_vec, CipherParams, KeyGenParams, KeyItem, KeygenService, PkCipherContext,
};

fn generate(service: &KeygenService, params: KeyGenParams) -> (KeyItem, KeyItem) {
    let mut private = KeyItem::for_algorithm(params.algorithm()).unwrap();
    let mut public = KeyItem::for_algorithm(params.algorithm()).unwrap();
    service
        .generate(params, &mut private, &mut public)
        .unwrap();
    (private, public)
}

/// Benchmark: RSA sign/verify across modulus sizes
fn bench_rsa_sign_verify(c: &mut Criterion) {
    let service = KeygenService::start(EngineConfig::default()).unwrap();
    let digest = hash_memory(AlgorithmId::Sha1, b"benchmark payload").unwrap();

    for bits in [1024u32, 2048] {
        let (private, public) = generate(&service, KeyGenParams::rsa(bits));
        let params = CipherParams::for_algorithm(private.algorithm()).unwrap();
        let signer = PkCipherContext::bind(private.algorithm(), &private, &params).unwrap();
        let verifier = PkCipherContext::bind(public.algorithm(), &public, &params).unwrap();
        let signature = signer.sign(&digest).unwrap();

        c.bench_with_input(BenchmarkId::new("rsa_sign", bits), &bits, |b, _| {
            b.iter(|| black_box(signer.sign(black_box(&digest)).unwrap()))
        });
        c.bench_with_input(BenchmarkId::new("rsa_verify", bits), &bits, |b, _| {
            b.iter(|| black_box(verifier.verify(black_box(&signature), &digest).unwrap()))
        });
    }
}

/// Benchmark: DSA sign/verify with the default domain
fn bench_dsa_sign_verify(c: &mut Criterion) {
    let service = KeygenService::start(EngineConfig::default()).unwrap();
    let (private, public) = generate(&service, KeyGenParams::dsa());
    let params = CipherParams::for_algorithm(private.algorithm()).unwrap();
    let signer = PkCipherContext::bind(private.algorithm(), &private, &params).unwrap();
    let verifier = PkCipherContext::bind(public.algorithm(), &public, &params).unwrap();
    let digest = hash_memory(AlgorithmId::Sha1, b"benchmark payload").unwrap();
    let signature = signer.sign(&digest).unwrap();

    c.bench_function("dsa_sign_1024_160", |b| {
        b.iter(|| black_box(signer.sign(black_box(&digest)).unwrap()))
    });
    c.bench_function("dsa_verify_1024_160", |b| {
        b.iter(|| black_box(verifier.verify(black_box(&signature), &digest).unwrap()))
    });
}

/// Benchmark: exporting a private key
fn bench_pack(c: &mut Criterion) {
    let service = KeygenService::start(EngineConfig::default()).unwrap();
    let (private, _public) = generate(&service, KeyGenParams::rsa(2048));

    c.bench_function("pack_rsa_2048_private", |b| {
        b.iter(|| black_box(pack_to_vec(black_box(&private)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_rsa_sign_verify,
    bench_dsa_sign_verify,
    bench_pack
);
criterion_main!(benches);
