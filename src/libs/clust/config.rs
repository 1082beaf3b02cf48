use crate::libs::DerepError;

/// What to stop at and how to batch
#[derive(Debug, Clone, PartialEq)]
pub struct DerepConfig {
    /// Assemblies closer than this are redundant
    pub threshold: Option<f64>,
    /// Keep at most this many
    pub count: Option<usize>,
    /// Keep at most this fraction of the input
    pub fraction: Option<f64>,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for DerepConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            count: None,
            fraction: None,
            batch_size: 1_000_000,
            seed: 0,
        }
    }
}

impl DerepConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold: Some(threshold),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DerepError> {
        if self.threshold.is_none() && self.count.is_none() && self.fraction.is_none() {
            return Err(DerepError::Config(
                "at least one of --distance, --count or --fraction is required".to_string(),
            ));
        }
        if let Some(threshold) = self.threshold {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(DerepError::Config(format!(
                    "--distance must be in (0, 1], got {}",
                    threshold
                )));
            }
        }
        if self.count == Some(0) {
            return Err(DerepError::Config("--count must be positive".to_string()));
        }
        if let Some(fraction) = self.fraction {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(DerepError::Config(format!(
                    "--fraction must be in (0, 1), got {}",
                    fraction
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(DerepError::Config("--batch-size must be positive".to_string()));
        }
        Ok(())
    }

    /// Whether `total` assemblies need any distance at all.
    ///
    /// A count target that is already met leaves nothing to do, threshold or not.
    pub fn needs_distances(&self, total: usize) -> bool {
        if total < 2 {
            return false;
        }
        match self.target_count(total) {
            Some(count) => count < total,
            None => self.threshold.is_some(),
        }
    }

    /// The count target for `total` inputs; the lower of `count` and `fraction`.
    ///
    /// ```
    /// use derep::libs::clust::DerepConfig;
    /// let config = DerepConfig {
    ///     fraction: Some(0.25),
    ///     ..DerepConfig::default()
    /// };
    /// assert_eq!(config.target_count(8), Some(2));
    /// assert_eq!(config.target_count(9), Some(3));
    /// ```
    pub fn target_count(&self, total: usize) -> Option<usize> {
        let by_fraction = self
            .fraction
            .map(|f| ((total as f64 * f).ceil() as usize).max(1));
        match (self.count, by_fraction) {
            (Some(c), Some(f)) => Some(c.min(f)),
            (Some(c), None) => Some(c),
            (None, Some(f)) => Some(f),
            (None, None) => None,
        }
    }
}
