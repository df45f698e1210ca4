//! Construction parameters for [`crate::ChainedHashMap`].

use crate::error::ConfigError;

/// Number of buckets allocated by `ChainedHashMap::new`.
pub const DEFAULT_BUCKET_COUNT: usize = 10;

/// `len / bucket_count` at or above which an insert triggers growth.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// Multiplier applied to the bucket count on growth.
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

/// Bucket-count hint, load threshold and growth multiplier for a chained map.
///
/// ```
/// use forecast_index::HashMapConfig;
///
/// let config = HashMapConfig::default().with_bucket_count(64);
/// assert_eq!(config.bucket_count, 64);
/// assert_eq!(config.max_load_factor, 0.75);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashMapConfig {
    pub bucket_count: usize,
    pub max_load_factor: f64,
    pub growth_factor: f64,
}

impl Default for HashMapConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl HashMapConfig {
    pub fn new(bucket_count: usize, max_load_factor: f64, growth_factor: f64) -> Self {
        Self {
            bucket_count,
            max_load_factor,
            growth_factor,
        }
    }

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Checks the construction preconditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_count == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        if !(self.max_load_factor.is_finite() && self.max_load_factor > 0.0) {
            return Err(ConfigError::InvalidLoadFactor(self.max_load_factor));
        }
        if !(self.growth_factor.is_finite() && self.growth_factor > 1.0) {
            return Err(ConfigError::InvalidGrowthFactor(self.growth_factor));
        }
        if self.grown_bucket_count(self.bucket_count).is_none() {
            return Err(ConfigError::GrowthOverflow {
                bucket_count: self.bucket_count,
                growth_factor: self.growth_factor,
            });
        }
        Ok(())
    }

    /// Bucket count after one growth step from `current`, or `None` if that
    /// step does not fit in a `usize`.
    ///
    /// Truncates `current * growth_factor`, but always adds at least one
    /// bucket so factors barely above 1 still make progress.
    pub(crate) fn grown_bucket_count(&self, current: usize) -> Option<usize> {
        let scaled = current as f64 * self.growth_factor;
        // `usize::MAX as f64` rounds up to 2^64, so `<` excludes it.
        if !(scaled.is_finite() && scaled < usize::MAX as f64) {
            return None;
        }
        let next = current.checked_add(1)?;
        Some((scaled as usize).max(next))
    }
}
