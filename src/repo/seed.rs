//! Synthetic demo history.
//!
//! Generates a deterministic daily record of inflow, outflow, storage and
//! sector demand with a yearly seasonal cycle, so a fresh deployment produces
//! plausible plans without any imported data.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use super::InMemoryStore;
use crate::domain::{round3, Metric, Sector};
use crate::optimizer::clamp;

const INITIAL_STORAGE: f64 = 760.0;
const STORAGE_FLOOR: f64 = 250.0;
const STORAGE_CAP: f64 = 1180.0;

fn noise<R: Rng>(rng: &mut R, std_dev: f64) -> f64 {
    Normal::new(0.0, std_dev)
        .map(|n| n.sample(rng))
        .unwrap_or(0.0)
}

/// Seed `days` days of history ending the day before `end`. Returns the
/// number of days written; an already populated store is left untouched.
pub fn seed_history(store: &InMemoryStore, end: DateTime<Utc>, days: u32, seed: u64) -> u32 {
    if !store.is_empty() {
        return 0;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let start = end.date_naive().and_time(NaiveTime::default()).and_utc()
        - Duration::days(i64::from(days));
    let mut storage = INITIAL_STORAGE;

    for i in 0..days {
        let ts = start + Duration::days(i64::from(i));
        let seasonal = (2.0 * PI * f64::from(ts.ordinal()) / 365.0).sin();

        let inflow = (120.0 + 55.0 * seasonal + noise(&mut rng, 8.0)).max(25.0);
        let demands = [
            (Sector::Drinking, (56.0 + noise(&mut rng, 2.0)).max(30.0)),
            (Sector::Environment, (26.0 + noise(&mut rng, 1.5)).max(18.0)),
            (Sector::Industry, (34.0 + noise(&mut rng, 3.0)).max(22.0)),
            (
                Sector::Agriculture,
                (85.0 + 25.0 * seasonal + noise(&mut rng, 6.0)).max(40.0),
            ),
        ];

        let total: f64 = demands.iter().map(|(_, v)| v).sum();
        let outflow = (total * (0.95 + noise(&mut rng, 0.03))).max(35.0);
        storage = clamp(storage + inflow - outflow, STORAGE_FLOOR, STORAGE_CAP);

        store.record(Metric::Inflow, ts, round3(inflow));
        store.record(Metric::Outflow, ts, round3(outflow));
        store.record(Metric::Storage, ts, round3(storage));
        for (sector, value) in demands {
            store.record_demand(sector, ts, round3(value));
        }
    }

    days
}
