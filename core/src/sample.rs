//! Demo and synthetic sales datasets.
//!
//! RULE: Synthetic data never touches a platform RNG.
//! Every draw comes from a SampleRng seeded by the caller, so the
//! same seed always yields the same dataset.

use crate::{
    dataset::{CellValue, Dataset},
    error::DashResult,
    types::{COL_MARKET, COL_PRODUCT, COL_PROFIT, COL_SALES, COL_YEAR, COL_ZONE},
};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

const PRODUCTS: &[&str] = &["Laptop", "Smartphone", "Tablet", "Monitor", "Headphones"];
const MARKETS:  &[(&str, &str)] = &[
    ("North", "Zone A"),
    ("South", "Zone B"),
    ("East",  "Zone C"),
    ("West",  "Zone D"),
];

/// Deterministic RNG for dataset generation.
pub struct SampleRng {
    inner: Pcg64Mcg,
}

impl SampleRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }
}

fn columns() -> Vec<String> {
    [COL_PRODUCT, COL_MARKET, COL_ZONE, COL_SALES, COL_PROFIT, COL_YEAR]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn row(product: &str, market: &str, zone: &str, sales: i64, profit: i64, year: i64) -> Vec<CellValue> {
    vec![
        product.into(),
        market.into(),
        zone.into(),
        sales.into(),
        profit.into(),
        year.into(),
    ]
}

/// The six-row dataset offered as a download on the upload page.
pub fn sample_dataset() -> Dataset {
    let rows = vec![
        row("Laptop",     "North", "Zone A", 12000, 3000, 2021),
        row("Laptop",     "South", "Zone B",  8500, 1500, 2021),
        row("Smartphone", "North", "Zone A", 15000, 4500, 2022),
        row("Smartphone", "South", "Zone B",  9200, 2100, 2022),
        row("Laptop",     "North", "Zone A", 11000, 2800, 2023),
        row("Smartphone", "South", "Zone B", 14500, 4200, 2023),
    ];
    Dataset::new(columns(), rows).expect("sample dataset has a static, valid shape")
}

/// `rows` random sales records in the sample schema.
///
/// Sales are whole units in [1_000, 20_000); profit is 10–40% of sales.
pub fn synthetic_dataset(seed: u64, rows: usize) -> DashResult<Dataset> {
    let mut rng = SampleRng::new(seed);
    let mut out = Vec::with_capacity(rows);
    for _ in 0..rows {
        let product = *rng.pick(PRODUCTS);
        let (market, zone) = *rng.pick(MARKETS);
        let sales = 1_000 + rng.next_u64_below(19_000) as i64;
        let margin = 0.10 + rng.next_f64() * 0.30;
        let profit = (sales as f64 * margin).round() as i64;
        let year = 2019 + rng.next_u64_below(6) as i64;
        out.push(row(product, market, zone, sales, profit, year));
    }
    log::debug!("generated {rows} synthetic rows from seed {seed}");
    Dataset::new(columns(), out)
}
