use hcrypt_core::{IvLength, KeySize};
use hcrypt_crypto::{generate_symmetric_key, CbcCodec};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_seal_tdes_ede3(bencher: divan::Bencher, size: usize) {
    let key = generate_symmetric_key(KeySize::Triple);
    let codec = CbcCodec::new(IvLength::KeySize);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            codec
                .seal(divan::black_box(&key), divan::black_box(&data))
                .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_open_tdes_ede3(bencher: divan::Bencher, size: usize) {
    let key = generate_symmetric_key(KeySize::Triple);
    let codec = CbcCodec::new(IvLength::KeySize);
    let data = make_data(size);
    let sealed = codec.seal(&key, &data).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            codec
                .open(divan::black_box(&key), divan::black_box(&sealed))
                .unwrap()
        });
}

#[divan::bench(args = [1024, 65536])]
fn bench_seal_des(bencher: divan::Bencher, size: usize) {
    let key = generate_symmetric_key(KeySize::Single);
    let codec = CbcCodec::default();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            codec
                .seal(divan::black_box(&key), divan::black_box(&data))
                .unwrap()
        });
}

fn main() {
    divan::main();
}
