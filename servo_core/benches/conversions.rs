use criterion::{Criterion, black_box, criterion_group, criterion_main};
use servo_core::calibration::{Sample, extrapolate_border};
use servo_core::util::{degree_to_pulse, map_range};

// Feedback readings spread over the full 10-bit range
fn synth_readings(n: usize, seed: u32) -> Vec<i64> {
    let mut state = seed.max(1);
    (0..n)
        .map(|_| {
            let mut x = state;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            state = x;
            i64::from(x % 1024)
        })
        .collect()
}

pub fn bench_readback(c: &mut Criterion) {
    let readings = synth_readings(4096, 0xC0FFEE);
    c.bench_function("feedback_to_pulse_4096", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for &f in &readings {
                acc += map_range(black_box(f), 0, 1023, 500, 2500);
            }
            black_box(acc)
        })
    });
}

pub fn bench_degrees(c: &mut Criterion) {
    c.bench_function("degree_to_pulse_sweep", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for d in 0..=180u8 {
                acc += u32::from(degree_to_pulse(black_box(d), 500, 2500).unwrap_or(0));
            }
            black_box(acc)
        })
    });
}

pub fn bench_extrapolate(c: &mut Criterion) {
    let zero = Sample {
        pulse: 1500,
        feedback: 511,
    };
    let lo = Sample {
        pulse: 1148,
        feedback: 331,
    };
    let hi = Sample {
        pulse: 1852,
        feedback: 691,
    };
    c.bench_function("extrapolate_both_borders", |b| {
        b.iter(|| {
            let a = extrapolate_border(black_box(zero), black_box(lo), 500);
            let z = extrapolate_border(black_box(zero), black_box(hi), 2500);
            black_box((a, z))
        })
    });
}

criterion_group!(benches, bench_readback, bench_degrees, bench_extrapolate);
criterion_main!(benches);
