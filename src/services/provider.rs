/// Recommendation providers: remote model, synthetic fallback, and the chain joining them
use crate::clients::ModelClient;
use crate::domain::{
    CurrentSchedule, Generation, GenerationIssue, Impact, ModelRequest, ProviderSource,
    Recommendation, RecommendationRequest, RecommendationStatus, RecommendedChanges, TrainRecord,
};
use crate::errors::ProviderError;
use crate::utils::{list_pick, reduce_eta_minutes, s_pick, u_pick};
use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

const MIN_DELAY_REDUCTION: u32 = 5;
const HIGH_IMPROVEMENT_ABOVE: u32 = 10;
const ROUTE_VIAS: [&str; 3] = ["Bypass Junction", "Express Route", "Priority Track"];
const ALTERNATE_PLATFORMS: [&str; 2] = ["Platform 2", "Platform 5"];

pub const HIGH_IMPROVEMENT: &str = "High Improvement";
pub const MODERATE_IMPROVEMENT: &str = "Moderate Improvement";

/// Anything that turns a request into recommendations.
///
/// `trains` is the store snapshot the request was normalized from; providers
/// match request entries to it by public train number.
pub trait RecommendationProvider {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        request: &RecommendationRequest,
        trains: &[TrainRecord],
    ) -> impl Future<Output = Result<Generation, ProviderError>> + Send;
}

pub fn passenger_impact(delay_reduction: u32) -> &'static str {
    if delay_reduction > HIGH_IMPROVEMENT_ABOVE {
        HIGH_IMPROVEMENT
    } else {
        MODERATE_IMPROVEMENT
    }
}

/// Randomized value source for synthetic recommendations.
///
/// Cosmetic only: values have the right shape and ranges but predict nothing.
#[derive(Debug)]
pub struct Synthesizer {
    rng: Mutex<StdRng>,
}

impl Synthesizer {
    /// `seed = Some(s)` gives a reproducible sequence; `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self::from_rng(rng)
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Uniform in `[5, floor(0.8 * delay) + 5)`; exactly 5 when that range is empty.
    pub fn delay_reduction(&self, delay: u32) -> u32 {
        let spread = delay.saturating_mul(4) / 5;
        if spread == 0 {
            return MIN_DELAY_REDUCTION;
        }
        MIN_DELAY_REDUCTION.saturating_add(self.with_rng(|rng| rng.random_range(0..spread)))
    }

    /// Percentage in `[5, 20)`
    pub fn fuel_savings(&self) -> u32 {
        self.with_rng(|rng| rng.random_range(5..20))
    }

    /// Percentage in `[80, 100)`
    pub fn confidence_score(&self) -> u32 {
        self.with_rng(|rng| rng.random_range(80..100))
    }

    pub fn new_route(&self) -> Option<String> {
        self.with_rng(|rng| {
            rng.random_bool(0.5).then(|| {
                format!(
                    "Alternate via {}",
                    ROUTE_VIAS[rng.random_range(0..ROUTE_VIAS.len())]
                )
            })
        })
    }

    pub fn alternate_stations(&self) -> Option<Vec<String>> {
        self.with_rng(|rng| rng.random_bool(0.3))
            .then(|| ALTERNATE_PLATFORMS.iter().map(|p| p.to_string()).collect())
    }

    pub fn reasoning(&self, delay_reduction: u32) -> String {
        match self.with_rng(|rng| rng.random_range(0..4)) {
            0 => format!(
                "Rerouting through less congested track section reduces delay by {} minutes",
                delay_reduction
            ),
            1 => "Track utilization data suggests optimal time slot available".to_string(),
            2 => "Weather conditions favorable for speed optimization".to_string(),
            _ => "Passenger density allows for schedule adjustment".to_string(),
        }
    }

    /// Build one recommendation, filling every field the hint leaves open.
    ///
    /// Fails only when a new ETA has to be derived from a malformed train ETA.
    pub fn recommend(
        &self,
        train: &TrainRecord,
        id: String,
        hint: &ModelSuggestion,
    ) -> Result<Recommendation, String> {
        let delay_reduction = hint
            .delay_reduction
            .unwrap_or_else(|| self.delay_reduction(train.delay));

        let new_eta = match &hint.new_eta {
            Some(eta) => eta.clone(),
            None => reduce_eta_minutes(&train.eta, delay_reduction)
                .ok_or_else(|| format!("malformed ETA '{}'", train.eta))?,
        };

        let new_route = match &hint.alternative_route {
            Some(route) => Some(route.clone()),
            None => self.new_route(),
        };
        let alternate_stations = match &hint.alternative_platforms {
            Some(platforms) => Some(platforms.clone()),
            None => self.alternate_stations(),
        };

        let impact = Impact {
            delay_reduction,
            passenger_impact: hint
                .passenger_impact
                .clone()
                .unwrap_or_else(|| passenger_impact(delay_reduction).to_string()),
            fuel_savings: hint.fuel_savings.unwrap_or_else(|| self.fuel_savings()),
            confidence_score: hint
                .confidence_score
                .unwrap_or_else(|| self.confidence_score()),
        };

        let reasoning = match &hint.reasoning {
            Some(r) => r.clone(),
            None => self.reasoning(delay_reduction),
        };

        Ok(Recommendation {
            id,
            train_id: train.id.clone(),
            train_name: format!("{} ({})", train.name, train.number),
            current_schedule: CurrentSchedule {
                current_location: train.current_location.clone(),
                next_station: train.next_station.clone(),
                eta: train.eta.clone(),
                delay: train.delay,
            },
            recommended_changes: RecommendedChanges {
                new_route,
                new_eta,
                delay_reduction,
                alternate_stations,
            },
            impact,
            reasoning,
            status: RecommendationStatus::Pending,
        })
    }
}

/// Per-train fields a remote model may supply. Absent fields are synthesized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSuggestion {
    pub delay_reduction: Option<u32>,
    pub new_eta: Option<String>,
    pub alternative_route: Option<String>,
    pub alternative_platforms: Option<Vec<String>>,
    pub passenger_impact: Option<String>,
    pub fuel_savings: Option<u32>,
    pub confidence_score: Option<u32>,
    pub reasoning: Option<String>,
}

impl ModelSuggestion {
    fn from_value(v: &Value) -> Self {
        Self {
            delay_reduction: u_pick(v, &["delay_reduction"]),
            new_eta: s_pick(v, &["new_eta"]),
            alternative_route: s_pick(v, &["alternative_route"]),
            alternative_platforms: list_pick(v, &["alternative_platforms"]),
            passenger_impact: s_pick(v, &["passenger_impact"]),
            fuel_savings: u_pick(v, &["fuel_savings"]).map(|x| x.min(100)),
            confidence_score: u_pick(v, &["confidence_score"]).map(|x| x.min(100)),
            reasoning: s_pick(v, &["reasoning"]),
        }
    }
}

/// Read `recommendations[]` keyed by `train_id`; entries without a key are ignored.
pub fn parse_suggestions(body: &Value) -> Vec<(String, ModelSuggestion)> {
    body.get("recommendations")
        .and_then(|r| r.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    s_pick(e, &["train_id"]).map(|id| (id, ModelSuggestion::from_value(e)))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// One recommendation per requested train found in `trains`; everything else
/// becomes an issue and the batch carries on.
fn build_batch(
    synth: &Synthesizer,
    request: &RecommendationRequest,
    trains: &[TrainRecord],
    hints: &[(String, ModelSuggestion)],
    source: ProviderSource,
) -> Generation {
    let stamp = Utc::now().timestamp_millis();
    let no_hint = ModelSuggestion::default();
    let mut recommendations = Vec::with_capacity(request.trains.len());
    let mut issues = Vec::new();

    for (index, input) in request.trains.iter().enumerate() {
        let Some(train) = trains.iter().find(|t| t.number == input.id) else {
            issues.push(GenerationIssue {
                train_number: input.id.clone(),
                reason: "train is no longer in the store".to_string(),
            });
            continue;
        };

        let hint = hints
            .iter()
            .find(|(number, _)| *number == train.number)
            .map_or(&no_hint, |(_, h)| h);

        match synth.recommend(train, format!("rec_{}_{}", stamp, index), hint) {
            Ok(rec) => {
                debug!(
                    "Recommendation {} for train {}: -{} min",
                    rec.id, train.number, rec.recommended_changes.delay_reduction
                );
                recommendations.push(rec);
            }
            Err(reason) => {
                warn!("Skipping train {}: {}", train.number, reason);
                issues.push(GenerationIssue {
                    train_number: train.number.clone(),
                    reason,
                });
            }
        }
    }

    Generation {
        recommendations,
        issues,
        source,
    }
}

/// Fallback provider backed purely by the synthesizer
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    synth: Arc<Synthesizer>,
}

impl SyntheticProvider {
    pub fn new(synth: Arc<Synthesizer>) -> Self {
        Self { synth }
    }
}

impl RecommendationProvider for SyntheticProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn generate(
        &self,
        request: &RecommendationRequest,
        trains: &[TrainRecord],
    ) -> Result<Generation, ProviderError> {
        Ok(build_batch(
            &self.synth,
            request,
            trains,
            &[],
            ProviderSource::Synthetic,
        ))
    }
}

/// Provider calling the external model; gaps in its answer are synthesized per field
#[derive(Debug, Clone)]
pub struct RemoteProvider {
    client: ModelClient,
    synth: Arc<Synthesizer>,
}

impl RemoteProvider {
    pub fn new(client: ModelClient, synth: Arc<Synthesizer>) -> Self {
        Self { client, synth }
    }
}

impl RecommendationProvider for RemoteProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn generate(
        &self,
        request: &RecommendationRequest,
        trains: &[TrainRecord],
    ) -> Result<Generation, ProviderError> {
        let body = ModelRequest::from(request);
        let response = self.client.recommend(&body).await?;
        let hints = parse_suggestions(&response);
        info!(
            "Model endpoint returned {} suggestions for {} trains",
            hints.len(),
            request.trains.len()
        );
        Ok(build_batch(
            &self.synth,
            request,
            trains,
            &hints,
            ProviderSource::Remote,
        ))
    }
}

/// Try `primary`; on any error answer with `fallback` instead.
#[derive(Debug, Clone)]
pub struct FallbackProvider<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackProvider<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> RecommendationProvider for FallbackProvider<P, F>
where
    P: RecommendationProvider + Sync,
    F: RecommendationProvider + Sync,
{
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn generate(
        &self,
        request: &RecommendationRequest,
        trains: &[TrainRecord],
    ) -> Result<Generation, ProviderError> {
        match self.primary.generate(request, trains).await {
            Ok(generation) => Ok(generation),
            Err(ProviderError::NotConfigured) => {
                debug!(
                    "{} provider not configured, using {}",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fallback.generate(request, trains).await
            }
            Err(e) => {
                warn!(
                    "{} provider failed, falling back to {}: {}",
                    self.primary.name(),
                    self.fallback.name(),
                    e
                );
                self.fallback.generate(request, trains).await
            }
        }
    }
}

pub type DefaultProvider = FallbackProvider<RemoteProvider, SyntheticProvider>;

/// Remote model first, synthetic output on failure, one shared random source
pub fn default_provider(client: ModelClient, seed: Option<u64>) -> DefaultProvider {
    let synth = Arc::new(Synthesizer::new(seed));
    FallbackProvider::new(
        RemoteProvider::new(client, Arc::clone(&synth)),
        SyntheticProvider::new(synth),
    )
}
