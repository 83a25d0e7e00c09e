use carbon_tracker::models::{FootprintRecord, FuelType, MealType, WasteType};
use carbon_tracker::services::leaderboard::{build_leaderboard, Period};
use carbon_tracker::time_utils::format_utc_rfc3339;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Synthesize `count` records spread across `users` owners with varied
/// totals and timestamps. Deterministic, no I/O.
fn synth_records(count: usize, users: usize) -> Vec<FootprintRecord> {
    let base = chrono::DateTime::from_timestamp(1_760_000_000, 0).unwrap();

    (0..count)
        .map(|i| {
            let owner = format!("user_{:04}", i % users);
            let created_at = format_utc_rfc3339(base + chrono::Duration::minutes(i as i64));
            FootprintRecord {
                record_id: format!("{}_{}", owner, i),
                owner,
                car_travel_km: ((i * 37) % 500) as f64,
                fuel_type: FuelType::Petrol,
                flights_hours: 0.0,
                public_transport_km: ((i * 13) % 100) as f64,
                meals_per_day: 3,
                meal_type: MealType::Medium,
                electricity_kwh: ((i * 7) % 400) as f64,
                waste_kg: ((i * 3) % 20) as f64,
                waste_type: WasteType::Medium,
                created_at,
                total_emission: (((i * 37) % 500) as f64).mul_add(0.18, 108.0),
            }
        })
        .collect()
}

fn benchmark_build_leaderboard(c: &mut Criterion) {
    // Same record count, two grouping shapes: the board size is what the
    // sort step scales with
    let wide = synth_records(5_000, 1_000);
    let narrow = synth_records(5_000, 50);

    let mut group = c.benchmark_group("leaderboard_ranking");

    group.bench_function("a_thousand_users_five_records_each", |b| {
        b.iter(|| build_leaderboard(black_box(&wide), Period::All))
    });

    group.bench_function("fifty_users_a_hundred_records_each", |b| {
        b.iter(|| build_leaderboard(black_box(&narrow), Period::All))
    });

    group.finish();
}

criterion_group!(benches, benchmark_build_leaderboard);
criterion_main!(benches);
