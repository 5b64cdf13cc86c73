/// Business logic services layer
pub mod lifecycle;
pub mod metrics;
pub mod normalizer;
pub mod prediction;
pub mod provider;

pub use lifecycle::LifecycleManager;
pub use metrics::MetricsService;
pub use prediction::PredictionService;
pub use provider::{default_provider, DefaultProvider};
