use netsift_forest::RandomForestConfig;
use netsift_prep::UnknownCategoryPolicy;

/// Number of trees used when no forest configuration is supplied.
pub const DEFAULT_N_TREES: usize = 100;

/// Configuration for a pipeline run.
///
/// Construct via [`PipelineConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default                       |
/// |--------------------|-------------------------------|
/// | `test_ratio`       | 0.3                           |
/// | `seed`             | 42 (splitter and forest)      |
/// | `forest`           | 100 trees, sqrt features, Gini |
/// | `unknown_category` | `Missing`                     |
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub(crate) test_ratio: f64,
    pub(crate) seed: u64,
    pub(crate) forest: RandomForestConfig,
    pub(crate) unknown_category: UnknownCategoryPolicy,
}

impl PipelineConfig {
    /// Create a configuration with the defaults above.
    #[must_use]
    pub fn new() -> Self {
        let seed = 42;
        Self {
            test_ratio: 0.3,
            seed,
            forest: RandomForestConfig::default().with_seed(seed),
            unknown_category: UnknownCategoryPolicy::default(),
        }
    }

    /// Set the fraction of rows held out for evaluation.
    ///
    /// Validated when the split stage runs.
    #[must_use]
    pub fn with_test_ratio(mut self, test_ratio: f64) -> Self {
        self.test_ratio = test_ratio;
        self
    }

    /// Set the seed for both the row permutation and the forest.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.forest = self.forest.with_seed(seed);
        self
    }

    /// Replace the forest configuration; its seed is overridden by this config's seed.
    #[must_use]
    pub fn with_forest(mut self, forest: RandomForestConfig) -> Self {
        self.forest = forest.with_seed(self.seed);
        self
    }

    /// Set the unknown-category policy.
    #[must_use]
    pub fn with_unknown_category(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_category = policy;
        self
    }

    /// Return the test ratio.
    #[must_use]
    pub fn test_ratio(&self) -> f64 {
        self.test_ratio
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the forest configuration.
    #[must_use]
    pub fn forest(&self) -> &RandomForestConfig {
        &self.forest
    }

    /// Return the unknown-category policy.
    #[must_use]
    pub fn unknown_category(&self) -> UnknownCategoryPolicy {
        self.unknown_category
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
