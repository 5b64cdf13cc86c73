/// Simulated dashboard metrics, perturbed on a timer while live mode is on
use crate::domain::DashboardMetrics;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

const ON_TIME_START: f64 = 78.0;
const ON_TIME_BOUNDS: (f64, f64) = (65.0, 95.0);
const ON_TIME_STEP: f64 = 1.5;
const AVG_DELAY_START: f64 = 8.5;
const AVG_DELAY_BOUNDS: (f64, f64) = (2.0, 15.0);
const AVG_DELAY_STEP: f64 = 1.0;

#[derive(Debug)]
struct MetricsState {
    metrics: DashboardMetrics,
    rng: StdRng,
}

/// Owns the two display metrics. Never touches trains or recommendations.
#[derive(Debug)]
pub struct MetricsService {
    state: Mutex<MetricsState>,
}

impl MetricsService {
    pub fn new(live: bool, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            state: Mutex::new(MetricsState {
                metrics: DashboardMetrics {
                    trains_on_time: ON_TIME_START,
                    average_delay: AVG_DELAY_START,
                    live,
                },
                rng,
            }),
        }
    }

    pub fn current(&self) -> DashboardMetrics {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .metrics
    }

    pub fn set_live(&self, live: bool) -> DashboardMetrics {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.metrics.live = live;
        state.metrics
    }

    /// One random-walk step; returns `false` (and changes nothing) when not live.
    pub fn tick(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.metrics.live {
            return false;
        }
        let on_time_delta = (state.rng.random::<f64>() - 0.5) * ON_TIME_STEP;
        let delay_delta = (state.rng.random::<f64>() - 0.5) * AVG_DELAY_STEP;

        let metrics = &mut state.metrics;
        metrics.trains_on_time =
            (metrics.trains_on_time + on_time_delta).clamp(ON_TIME_BOUNDS.0, ON_TIME_BOUNDS.1);
        metrics.average_delay =
            (metrics.average_delay + delay_delta).clamp(AVG_DELAY_BOUNDS.0, AVG_DELAY_BOUNDS.1);
        true
    }
}
