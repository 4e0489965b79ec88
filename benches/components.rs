//! Component-level microbenchmarks for pixwrite.
//! Focuses on LZ77, the zlib stream, row filtering, the DCT and checksums.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixwrite::compress::deflate::zlib_compress;
use pixwrite::compress::lz77::{self, Token};
use pixwrite::compress::{adler32, crc32};
use pixwrite::jpeg::dct::fdct_8x8;
use pixwrite::png::filter::filter_image;
use pixwrite::{bmp, hdr, jpeg, png, tga, EncodeConfig, FilterType, PixelView};

fn make_pattern(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    while out.len() < len {
        out.extend_from_slice(pattern);
    }
    out.truncate(len);
    out
}

fn make_random(len: usize, mut seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
        out.push((seed >> 16) as u8);
    }
    out.truncate(len);
    out
}

fn gradient_image(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width) as u8;
            let g = ((y * 255) / height) as u8;
            let b = (((x + y) * 127) / (width + height)) as u8;
            pixels.extend_from_slice(&[r, g, b]);
        }
    }
    pixels
}

fn bench_lz77(c: &mut Criterion) {
    let compressible = make_pattern(1 << 20);
    let random = make_random(1 << 20, 0x1234_5678);

    let mut group = c.benchmark_group("lz77_tokenize");
    group.throughput(Throughput::Bytes(compressible.len() as u64));

    for quality in [lz77::MIN_QUALITY, 8, 32] {
        group.bench_with_input(
            BenchmarkId::new("compressible", quality),
            &compressible,
            |b, data| {
                b.iter(|| {
                    let mut matches = 0usize;
                    lz77::tokenize(black_box(data), quality, |token| {
                        if let Token::Match { .. } = token {
                            matches += 1;
                        }
                    })
                    .unwrap();
                    black_box(matches)
                });
            },
        );
    }

    group.bench_with_input(BenchmarkId::new("random", 8), &random, |b, data| {
        b.iter(|| {
            let mut tokens = 0usize;
            lz77::tokenize(black_box(data), 8, |_| tokens += 1).unwrap();
            black_box(tokens)
        });
    });

    group.finish();
}

fn bench_zlib(c: &mut Criterion) {
    let compressible = make_pattern(1 << 20);
    let random = make_random(1 << 20, 0xCAFE_BABE);

    let mut group = c.benchmark_group("zlib_compress");
    group.throughput(Throughput::Bytes(compressible.len() as u64));

    group.bench_function("compressible_1mb", |b| {
        b.iter(|| black_box(zlib_compress(black_box(&compressible), 8).unwrap()));
    });

    group.bench_function("random_1mb", |b| {
        b.iter(|| black_box(zlib_compress(black_box(&random), 8).unwrap()));
    });

    group.finish();
}

fn bench_filters(c: &mut Criterion) {
    let width = 512;
    let height = 512;
    let pixels = gradient_image(width, height);
    let view = PixelView::new(&pixels, width, height, 3).unwrap();

    let mut group = c.benchmark_group("png_filters");
    group.throughput(Throughput::Bytes(pixels.len() as u64));

    group.bench_function("auto_512_rgb", |b| {
        b.iter(|| black_box(filter_image(black_box(&view), false, None).unwrap()));
    });

    group.bench_function("paeth_512_rgb", |b| {
        b.iter(|| {
            black_box(filter_image(black_box(&view), false, Some(FilterType::Paeth)).unwrap())
        });
    });

    group.finish();
}

fn bench_checksums(c: &mut Criterion) {
    let data = make_random(1 << 20, 0xDEAD_BEEF);

    let mut group = c.benchmark_group("checksums");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("adler32_1mb", |b| {
        b.iter(|| black_box(adler32::adler32(black_box(&data))));
    });

    group.bench_function("crc32_1mb", |b| {
        b.iter(|| black_box(crc32::crc32(black_box(&data))));
    });

    group.finish();
}

fn bench_dct(c: &mut Criterion) {
    let mut block = [0f32; 64];
    for (i, v) in block.iter_mut().enumerate() {
        *v = ((i * 37) % 255) as f32 - 128.0;
    }

    c.bench_function("fdct_8x8", |b| {
        b.iter(|| {
            let mut data = black_box(block);
            fdct_8x8(&mut data);
            black_box(data)
        });
    });
}

fn bench_encoders(c: &mut Criterion) {
    let width = 512;
    let height = 512;
    let pixels = gradient_image(width, height);
    let linear: Vec<f32> = pixels.iter().map(|&v| v as f32 / 255.0).collect();
    let view = PixelView::new(&pixels, width, height, 3).unwrap();
    let config = EncodeConfig::default();

    let mut group = c.benchmark_group("encode_512_rgb");
    group.throughput(Throughput::Bytes(pixels.len() as u64));

    group.bench_function("png", |b| {
        b.iter(|| black_box(png::encode_with_config(black_box(&view), &config).unwrap()));
    });

    for quality in [50u8, 90] {
        group.bench_with_input(BenchmarkId::new("jpeg", quality), &quality, |b, &q| {
            b.iter(|| black_box(jpeg::encode(black_box(&pixels), width, height, 3, q).unwrap()));
        });
    }

    group.bench_function("bmp", |b| {
        b.iter(|| black_box(bmp::encode(black_box(&pixels), width, height, 3).unwrap()));
    });

    group.bench_function("tga_rle", |b| {
        b.iter(|| black_box(tga::encode(black_box(&pixels), width, height, 3).unwrap()));
    });

    group.bench_function("hdr", |b| {
        b.iter(|| black_box(hdr::encode(black_box(&linear), width, height, 3).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_lz77,
    bench_zlib,
    bench_filters,
    bench_checksums,
    bench_dct,
    bench_encoders
);
criterion_main!(benches);
