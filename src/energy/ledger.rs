//! Prefix-sum and fixed-duration window cost tables.

use std::sync::Arc;

/// Cost reported for a window that does not fit inside the horizon.
///
/// Large enough that no feasible placement can be worse, finite so it stays
/// well-behaved when scaled by a consumption rate.
pub const OUT_OF_HORIZON_COST: f64 = 1.0e12;

/// Precomputed energy cost tables for one price series.
///
/// # Invariants
///
/// - `prefix[0] == 0` and `prefix[i] == prefix[i - 1] + price[i - 1]`, so the
///   cost of `[s, e)` is `prefix[e] - prefix[s]`.
/// - `windows[d - 1][s]` is the cost of `[s, s + d)` for every duration
///   `1 <= d <= H`, or [`OUT_OF_HORIZON_COST`] when `s + d > H`.
///
/// Construction is O(H²) in time and space; every query afterwards is O(1).
/// Rows are shared as `Arc<[f64]>` so models can reference them without
/// copying.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyLedger {
    prices: Arc<[f64]>,
    prefix: Arc<[f64]>,
    windows: Vec<Arc<[f64]>>,
}

impl EnergyLedger {
    pub fn new(prices: &[f64]) -> Self {
        let horizon = prices.len();

        let mut prefix = Vec::with_capacity(horizon + 1);
        prefix.push(0.0);
        for (i, price) in prices.iter().enumerate() {
            prefix.push(prefix[i] + price);
        }

        let windows = (1..=horizon)
            .map(|duration| rolling_window(prices, &prefix, duration))
            .collect();

        Self {
            prices: prices.into(),
            prefix: prefix.into(),
            windows,
        }
    }

    /// Number of slots covered by the price series.
    pub fn horizon(&self) -> usize {
        self.prices.len()
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Shared prefix-sum table of length `H + 1`.
    pub fn prefix_sums(&self) -> Arc<[f64]> {
        Arc::clone(&self.prefix)
    }

    /// Cost of the half-open slot range `[start, end)`.
    ///
    /// Returns [`OUT_OF_HORIZON_COST`] when the range is inverted or ends past
    /// the horizon.
    pub fn cost_of_interval(&self, start: usize, end: usize) -> f64 {
        if start > end || end > self.horizon() {
            return OUT_OF_HORIZON_COST;
        }
        self.prefix[end] - self.prefix[start]
    }

    /// Cost of a window of `duration` slots starting at `start`.
    ///
    /// Returns [`OUT_OF_HORIZON_COST`] when `start + duration > H`.
    pub fn cost_of_fixed_duration(&self, duration: usize, start: usize) -> f64 {
        if start + duration > self.horizon() {
            return OUT_OF_HORIZON_COST;
        }
        match duration {
            0 => 0.0,
            d => self.windows[d - 1][start],
        }
    }

    /// Cost of every start slot for a fixed duration, indexed by start.
    ///
    /// The returned row has `H` entries; starts whose window would leave the
    /// horizon hold [`OUT_OF_HORIZON_COST`].
    pub fn window_costs(&self, duration: usize) -> Arc<[f64]> {
        match duration {
            0 => vec![0.0; self.horizon()].into(),
            d if d <= self.horizon() => Arc::clone(&self.windows[d - 1]),
            _ => vec![OUT_OF_HORIZON_COST; self.horizon()].into(),
        }
    }
}

fn rolling_window(prices: &[f64], prefix: &[f64], duration: usize) -> Arc<[f64]> {
    let horizon = prices.len();
    let mut row = vec![OUT_OF_HORIZON_COST; horizon];
    let last_start = horizon - duration;

    row[0] = prefix[duration];
    for s in 1..=last_start {
        row[s] = row[s - 1] - prices[s - 1] + prices[s - 1 + duration];
    }
    row.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPS: f64 = 1e-9;

    fn naive(prices: &[f64], start: usize, end: usize) -> f64 {
        prices[start..end].iter().sum()
    }

    fn random_prices(seed: u64, len: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(0.0..50.0)).collect()
    }

    #[test]
    fn test_prefix_sums() {
        let ledger = EnergyLedger::new(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(&*ledger.prefix_sums(), &[0.0, 1.0, 3.0, 6.0, 10.0]);
        assert_eq!(ledger.horizon(), 4);
    }

    #[test]
    fn test_cost_of_interval_matches_naive_sum() {
        let prices = random_prices(7, 24);
        let ledger = EnergyLedger::new(&prices);
        for start in 0..=prices.len() {
            for end in start..=prices.len() {
                let expected = naive(&prices, start, end);
                assert!((ledger.cost_of_interval(start, end) - expected).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_cost_of_fixed_duration_matches_naive_sum() {
        let prices = random_prices(11, 24);
        let horizon = prices.len();
        let ledger = EnergyLedger::new(&prices);
        for duration in 1..=horizon {
            for start in 0..horizon {
                let cost = ledger.cost_of_fixed_duration(duration, start);
                if start + duration <= horizon {
                    let expected = naive(&prices, start, start + duration);
                    assert!((cost - expected).abs() < 1e-6, "d={duration} s={start}");
                } else {
                    assert_eq!(cost, OUT_OF_HORIZON_COST);
                }
            }
        }
    }

    #[test]
    fn test_cheapest_window() {
        let ledger = EnergyLedger::new(&[1.0, 2.0, 3.0, 4.0]);
        let row = ledger.window_costs(2);
        assert_eq!(&row[..3], &[3.0, 5.0, 7.0]);
        assert_eq!(row[3], OUT_OF_HORIZON_COST);
    }

    #[test]
    fn test_out_of_range_queries() {
        let ledger = EnergyLedger::new(&[1.0, 2.0, 3.0]);
        assert_eq!(ledger.cost_of_interval(2, 1), OUT_OF_HORIZON_COST);
        assert_eq!(ledger.cost_of_interval(0, 4), OUT_OF_HORIZON_COST);
        assert_eq!(ledger.cost_of_fixed_duration(4, 0), OUT_OF_HORIZON_COST);
        assert_eq!(ledger.cost_of_fixed_duration(0, 3), 0.0);
        assert!(ledger.window_costs(5).iter().all(|&c| c == OUT_OF_HORIZON_COST));
    }

    #[test]
    fn test_full_horizon_window() {
        let ledger = EnergyLedger::new(&[1.0, 2.0, 3.0]);
        assert_eq!(ledger.cost_of_fixed_duration(3, 0), 6.0);
    }

    #[test]
    fn test_construction_is_idempotent() {
        let prices = random_prices(3, 48);
        assert_eq!(EnergyLedger::new(&prices), EnergyLedger::new(&prices));
    }

    #[test]
    fn test_empty_series() {
        let ledger = EnergyLedger::new(&[]);
        assert_eq!(ledger.horizon(), 0);
        assert_eq!(ledger.cost_of_interval(0, 0), 0.0);
        assert_eq!(ledger.cost_of_fixed_duration(1, 0), OUT_OF_HORIZON_COST);
    }
}
