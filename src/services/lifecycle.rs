/// Recommendation lifecycle: single-flight analysis runs, apply and reject
use crate::domain::{
    AnalysisPhase, AnalysisReport, AnalysisSummary, Generation, GenerationIssue, ProviderSource,
    Recommendation, RecommendationRequest, RecommendationStatus,
};
use crate::errors::{ApiError, ApiResult};
use crate::repo::TrainStore;
use crate::services::provider::RecommendationProvider;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug)]
struct Session {
    phase: AnalysisPhase,
    source: Option<ProviderSource>,
    generated_at: Option<DateTime<Utc>>,
    recommendations: Vec<Recommendation>,
    issues: Vec<GenerationIssue>,
}

impl Session {
    fn summary(&self) -> AnalysisSummary {
        let count = self.recommendations.len();
        let total_delay_reduction = self
            .recommendations
            .iter()
            .filter(|r| r.status == RecommendationStatus::Applied)
            .map(|r| r.impact.delay_reduction)
            .sum();
        let average_confidence = if count == 0 {
            0
        } else {
            let total: u64 = self
                .recommendations
                .iter()
                .map(|r| u64::from(r.impact.confidence_score))
                .sum();
            (total as f64 / count as f64).round() as u32
        };

        AnalysisSummary {
            phase: self.phase,
            generated_at: self.generated_at,
            count,
            total_delay_reduction,
            average_confidence,
        }
    }

    fn report(&self) -> AnalysisReport {
        AnalysisReport {
            source: self.source,
            recommendations: self.recommendations.clone(),
            issues: self.issues.clone(),
            summary: self.summary(),
        }
    }

    fn find_mut(&mut self, id: &str) -> ApiResult<&mut Recommendation> {
        self.recommendations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("recommendation {}", id)))
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a run in flight. Dropping it without `complete` (provider error,
/// panic in the provider) puts the phase back to what it was.
struct RunGuard<'a> {
    session: &'a Mutex<Session>,
    restore: AnalysisPhase,
    completed: bool,
}

impl RunGuard<'_> {
    fn complete(mut self, generation: Generation) -> AnalysisReport {
        let mut session = lock(self.session);
        session.phase = AnalysisPhase::Done;
        session.source = Some(generation.source);
        session.generated_at = Some(Utc::now());
        session.recommendations = generation.recommendations;
        session.issues = generation.issues;
        self.completed = true;
        session.report()
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            lock(self.session).phase = self.restore;
        }
    }
}

/// Owns the current result set and applies accepted recommendations to the store.
///
/// At most one analysis runs at a time; a second `run_analysis` while one is
/// in flight fails with `AnalysisInProgress` instead of queueing.
#[derive(Debug)]
pub struct LifecycleManager<P> {
    provider: P,
    store: TrainStore,
    session: Mutex<Session>,
}

impl<P: RecommendationProvider> LifecycleManager<P> {
    pub fn new(provider: P, store: TrainStore) -> Self {
        Self {
            provider,
            store,
            session: Mutex::new(Session {
                phase: AnalysisPhase::Idle,
                source: None,
                generated_at: None,
                recommendations: Vec::new(),
                issues: Vec::new(),
            }),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> AnalysisPhase {
        lock(&self.session).phase
    }

    pub fn report(&self) -> AnalysisReport {
        lock(&self.session).report()
    }

    #[cfg(test)]
    pub fn summary(&self) -> AnalysisSummary {
        lock(&self.session).summary()
    }

    fn begin_run(&self) -> ApiResult<RunGuard<'_>> {
        let mut session = lock(&self.session);
        if session.phase == AnalysisPhase::Running {
            return Err(ApiError::AnalysisInProgress);
        }
        let restore = session.phase;
        session.phase = AnalysisPhase::Running;
        Ok(RunGuard {
            session: &self.session,
            restore,
            completed: false,
        })
    }

    /// Generate a fresh result set, replacing the previous one wholesale.
    ///
    /// The run itself is a detached task: a caller that goes away stops
    /// waiting, but the run still completes and publishes its result set.
    pub async fn run_analysis(
        self: &Arc<Self>,
        request: RecommendationRequest,
    ) -> ApiResult<AnalysisReport>
    where
        P: Send + Sync + 'static,
    {
        if request.trains.is_empty() {
            return Err(ApiError::Validation("no trains selected".to_string()));
        }

        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.execute(request).await })
            .await
            .map_err(|e| ApiError::Internal(format!("analysis task failed: {}", e)))?
    }

    async fn execute(&self, request: RecommendationRequest) -> ApiResult<AnalysisReport> {
        let run = self.begin_run()?;
        let trains = self.store.snapshot();
        info!(
            "Running analysis for {} trains via {} provider",
            request.trains.len(),
            self.provider.name()
        );

        let generation = self.provider.generate(&request, &trains).await?;
        let report = run.complete(generation);

        info!(
            "Analysis done: {} recommendations, {} skipped trains",
            report.summary.count,
            report.issues.len()
        );
        Ok(report)
    }

    /// Apply a pending recommendation to its train: new ETA, delay reduced (floored at 0).
    pub fn apply(&self, id: &str) -> ApiResult<Recommendation> {
        let mut session = lock(&self.session);
        let rec = session.find_mut(id)?;

        if rec.status != RecommendationStatus::Pending {
            return Err(ApiError::InvalidStateTransition {
                id: id.to_string(),
                from: rec.status,
                to: RecommendationStatus::Applied,
            });
        }

        let new_eta = rec.recommended_changes.new_eta.clone();
        let reduction = rec.recommended_changes.delay_reduction;
        let delay = self
            .store
            .update(&rec.train_id, move |train| {
                train.eta = new_eta;
                train.delay = train.delay.saturating_sub(reduction);
                train.delay
            })
            .ok_or_else(|| {
                ApiError::NotFound(format!("train {} is no longer in the store", rec.train_id))
            })?;

        rec.status = RecommendationStatus::Applied;
        info!(
            "Applied recommendation {} to train {}: delay now {} min",
            rec.id, rec.train_id, delay
        );
        Ok(rec.clone())
    }

    /// Reject a recommendation. Rejecting twice is a no-op; an applied one stays applied.
    pub fn reject(&self, id: &str) -> ApiResult<Recommendation> {
        let mut session = lock(&self.session);
        let rec = session.find_mut(id)?;

        match rec.status {
            RecommendationStatus::Pending => {
                rec.status = RecommendationStatus::Rejected;
                info!("Rejected recommendation {}", rec.id);
            }
            RecommendationStatus::Rejected => {
                debug!("Recommendation {} already rejected", rec.id);
            }
            RecommendationStatus::Applied => {
                return Err(ApiError::InvalidStateTransition {
                    id: id.to_string(),
                    from: RecommendationStatus::Applied,
                    to: RecommendationStatus::Rejected,
                });
            }
        }
        Ok(rec.clone())
    }
}
