//! Position-keyed invalidation for the quantities derived from one template.

use crate::consts::POSITION_TOLERANCE;

/// A quantity the correlator can report at a query position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    Value,
    Dx,
    Dy,
    Ddx,
    Ddy,
}

impl Quantity {
    pub const ALL: [Quantity; 5] = [
        Quantity::Value,
        Quantity::Dx,
        Quantity::Dy,
        Quantity::Ddx,
        Quantity::Ddy,
    ];

    fn index(self) -> usize {
        match self {
            Quantity::Value => 0,
            Quantity::Dx => 1,
            Quantity::Dy => 2,
            Quantity::Ddx => 3,
            Quantity::Ddy => 4,
        }
    }
}

/// How often positions were checked and quantities recomputed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub checks: usize,
    pub updates: usize,
}

/// Cached quantities plus the template they were computed from, all valid
/// only for `position`.
#[derive(Debug)]
pub struct QuantityCache {
    position: (f64, f64),
    template_fresh: bool,
    values: [Option<f64>; 5],
    stats: CacheStats,
}

impl Default for QuantityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantityCache {
    /// Everything starts stale, keyed at the origin.
    pub fn new() -> Self {
        Self {
            position: (0.0, 0.0),
            template_fresh: false,
            values: [None; 5],
            stats: CacheStats::default(),
        }
    }

    /// Move the cache key to `(x, y)`, dropping every cached value if it
    /// differs from the current key by more than the position tolerance.
    pub fn check(&mut self, x: f64, y: f64) {
        self.stats.checks += 1;
        let (last_x, last_y) = self.position;
        let moved = !((last_x - x).abs() <= POSITION_TOLERANCE
            && (last_y - y).abs() <= POSITION_TOLERANCE);
        if moved {
            self.invalidate();
            self.position = (x, y);
        }
    }

    /// Mark the template and every quantity stale without moving the key.
    pub fn invalidate(&mut self) {
        self.template_fresh = false;
        self.values = [None; 5];
    }

    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        self.values[quantity.index()]
    }

    pub fn store(&mut self, quantity: Quantity, value: f64) {
        self.values[quantity.index()] = Some(value);
        self.stats.updates += 1;
    }

    pub fn is_template_fresh(&self) -> bool {
        self.template_fresh
    }

    pub fn mark_template_fresh(&mut self) {
        self.template_fresh = true;
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_stale() {
        let cache = QuantityCache::new();
        assert!(!cache.is_template_fresh());
        for q in Quantity::ALL {
            assert_eq!(cache.get(q), None);
        }
    }

    #[test]
    fn test_small_moves_keep_values() {
        let mut cache = QuantityCache::new();
        cache.check(1.0, 2.0);
        cache.mark_template_fresh();
        cache.store(Quantity::Dx, 3.0);

        cache.check(1.0 + 1e-12, 2.0 - 1e-12);
        assert_eq!(cache.get(Quantity::Dx), Some(3.0));
        assert!(cache.is_template_fresh());
        assert_eq!(cache.position(), (1.0, 2.0));
    }

    #[test]
    fn test_move_invalidates_everything() {
        let mut cache = QuantityCache::new();
        cache.check(1.0, 2.0);
        cache.mark_template_fresh();
        for q in Quantity::ALL {
            cache.store(q, 1.0);
        }

        cache.check(1.0, 2.0 + 1e-6);
        assert!(!cache.is_template_fresh());
        for q in Quantity::ALL {
            assert_eq!(cache.get(q), None);
        }
        assert_eq!(
            cache.stats(),
            CacheStats {
                checks: 2,
                updates: 5
            }
        );
    }

    #[test]
    fn test_nan_position_always_invalidates() {
        let mut cache = QuantityCache::new();
        cache.store(Quantity::Value, 1.0);
        cache.check(f64::NAN, 0.0);
        assert_eq!(cache.get(Quantity::Value), None);
    }
}
