/// Domain models for the application
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network zone a train runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Northern,
    Southern,
    Western,
    Eastern,
    Central,
    #[serde(rename = "North Eastern")]
    NorthEastern,
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Northern" => Ok(Zone::Northern),
            "Southern" => Ok(Zone::Southern),
            "Western" => Ok(Zone::Western),
            "Eastern" => Ok(Zone::Eastern),
            "Central" => Ok(Zone::Central),
            "North Eastern" => Ok(Zone::NorthEastern),
            other => Err(format!("unknown zone '{}'", other)),
        }
    }
}

/// Running status as displayed on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrainStatus {
    OnTime,
    Delayed,
    Moving,
    Other(String),
}

impl From<String> for TrainStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "On Time" => TrainStatus::OnTime,
            "Delayed" => TrainStatus::Delayed,
            "Moving" => TrainStatus::Moving,
            _ => TrainStatus::Other(s),
        }
    }
}

impl From<TrainStatus> for String {
    fn from(status: TrainStatus) -> Self {
        match status {
            TrainStatus::OnTime => "On Time".to_string(),
            TrainStatus::Delayed => "Delayed".to_string(),
            TrainStatus::Moving => "Moving".to_string(),
            TrainStatus::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Service category. Unknown categories (e.g. "Goods") are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrainType {
    Express,
    Passenger,
    Freight,
    Local,
    Superfast,
    Other(String),
}

impl TrainType {
    pub fn as_str(&self) -> &str {
        match self {
            TrainType::Express => "Express",
            TrainType::Passenger => "Passenger",
            TrainType::Freight => "Freight",
            TrainType::Local => "Local",
            TrainType::Superfast => "Superfast",
            TrainType::Other(s) => s,
        }
    }
}

impl From<String> for TrainType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Express" => TrainType::Express,
            "Passenger" => TrainType::Passenger,
            "Freight" => TrainType::Freight,
            "Local" => TrainType::Local,
            "Superfast" => TrainType::Superfast,
            _ => TrainType::Other(s),
        }
    }
}

impl From<TrainType> for String {
    fn from(t: TrainType) -> Self {
        match t {
            TrainType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// One physical service in the fleet snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRecord {
    pub id: String,
    pub name: String,
    /// Public train number; this is what the model sees as `id`.
    pub number: String,
    pub route: String,
    pub zone: Zone,
    pub status: TrainStatus,
    pub current_location: String,
    pub next_station: String,
    /// `HH:MM`, 24h clock, no date
    pub eta: String,
    pub delay: u32,
    pub passengers: u32,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub train_type: TrainType,
}

/// Minimal projection of a train as the recommendation model expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInput {
    pub id: String,
    #[serde(rename = "type")]
    pub train_type: String,
    pub rel_arrival: i64,
    pub rel_departure: i64,
    pub delay: u32,
    pub passengers: u32,
    pub platform: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    #[default]
    MinimizeDelays,
    MaximizeThroughput,
    OptimizeFuel,
    PassengerComfort,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeHorizon {
    #[serde(rename = "1_hour")]
    OneHour,
    #[default]
    #[serde(rename = "2_hours")]
    TwoHours,
    #[serde(rename = "4_hours")]
    FourHours,
    #[serde(rename = "8_hours")]
    EightHours,
    #[serde(rename = "24_hours")]
    TwentyFourHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherConditions {
    #[default]
    Normal,
    LightRain,
    HeavyRain,
    Fog,
    ExtremeWeather,
}

/// Percentage sliders, each 0..=100, set independently (no sum constraint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityWeights {
    pub on_time: u32,
    pub passenger_comfort: u32,
    pub fuel_efficiency: u32,
    pub track_utilization: u32,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            on_time: 80,
            passenger_comfort: 60,
            fuel_efficiency: 40,
            track_utilization: 70,
        }
    }
}

impl PriorityWeights {
    pub fn as_pairs(&self) -> [(&'static str, u32); 4] {
        [
            ("onTime", self.on_time),
            ("passengerComfort", self.passenger_comfort),
            ("fuelEfficiency", self.fuel_efficiency),
            ("trackUtilization", self.track_utilization),
        ]
    }
}

/// Model-ready request. Serialized form is the exported artifact layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub trains: Vec<ModelInput>,
    pub optimization_goal: OptimizationGoal,
    pub time_horizon: TimeHorizon,
    pub weather_conditions: WeatherConditions,
    pub special_events: String,
    pub priority_weights: PriorityWeights,
}

/// Body POSTed to the remote recommendation model
#[derive(Debug, Serialize)]
pub struct ModelRequest<'a> {
    pub trains: &'a [ModelInput],
    pub optimization_goal: OptimizationGoal,
    pub time_horizon: TimeHorizon,
    pub weather_conditions: WeatherConditions,
    pub special_events: &'a str,
    pub priority_weights: PriorityWeights,
}

impl<'a> From<&'a RecommendationRequest> for ModelRequest<'a> {
    fn from(req: &'a RecommendationRequest) -> Self {
        Self {
            trains: &req.trains,
            optimization_goal: req.optimization_goal,
            time_horizon: req.time_horizon,
            weather_conditions: req.weather_conditions,
            special_events: &req.special_events,
            priority_weights: req.priority_weights,
        }
    }
}

/// Downloadable snapshot of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedRequest {
    #[serde(flatten)]
    pub request: RecommendationRequest,
    pub exported_at: DateTime<Utc>,
}

impl ExportedRequest {
    pub fn file_name(&self) -> String {
        format!("ai-model-input-{}.json", self.exported_at.format("%Y-%m-%d"))
    }
}

/// Which trains an analysis covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrainSelection {
    /// Explicit checkbox set, by public train number, in click order
    Numbers { numbers: Vec<String> },
    All,
    /// Every train with `delay > 0`
    DelayedOnly,
}

/// Analysis form as submitted by the dashboard
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    pub selection: TrainSelection,
    #[serde(default)]
    pub optimization_goal: OptimizationGoal,
    #[serde(default)]
    pub time_horizon: TimeHorizon,
    #[serde(default)]
    pub weather_conditions: WeatherConditions,
    #[serde(default)]
    pub special_events: String,
    #[serde(default)]
    pub priority_weights: PriorityWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Pending,
    Applied,
    Rejected,
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationStatus::Pending => write!(f, "pending"),
            RecommendationStatus::Applied => write!(f, "applied"),
            RecommendationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Train state captured when a recommendation was generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSchedule {
    pub current_location: String,
    pub next_station: String,
    pub eta: String,
    pub delay: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_route: Option<String>,
    #[serde(rename = "newETA")]
    pub new_eta: String,
    pub delay_reduction: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_stations: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub delay_reduction: u32,
    pub passenger_impact: String,
    pub fuel_savings: u32,
    pub confidence_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    /// Internal train id, not the public number
    pub train_id: String,
    pub train_name: String,
    pub current_schedule: CurrentSchedule,
    pub recommended_changes: RecommendedChanges,
    pub impact: Impact,
    pub reasoning: String,
    pub status: RecommendationStatus,
}

/// Where a result set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSource {
    Remote,
    Synthetic,
}

/// A selected train that produced no recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationIssue {
    pub train_number: String,
    pub reason: String,
}

/// Provider output for one run
#[derive(Debug, Clone)]
pub struct Generation {
    pub recommendations: Vec<Recommendation>,
    pub issues: Vec<GenerationIssue>,
    pub source: ProviderSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPhase {
    Idle,
    Running,
    Done,
}

/// Aggregate view over the current result set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub phase: AnalysisPhase,
    pub generated_at: Option<DateTime<Utc>>,
    pub count: usize,
    /// Sum over `applied` entries only
    pub total_delay_reduction: u32,
    /// Rounded mean confidence over all entries, 0 when empty
    pub average_confidence: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub source: Option<ProviderSource>,
    pub recommendations: Vec<Recommendation>,
    pub issues: Vec<GenerationIssue>,
    pub summary: AnalysisSummary,
}

/// Simulated dashboard metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub trains_on_time: f64,
    pub average_delay: f64,
    pub live: bool,
}

/// Departure form row for the backend predictor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepartureInput {
    pub train_id: String,
    #[serde(rename = "type")]
    pub train_type: String,
    pub delay: u32,
    pub passenger_count: u32,
    pub platform: u32,
    pub departure_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainData {
    pub train_id: String,
    pub departure_time: String,
    pub destination: String,
    pub delay: u32,
    pub passengers: u32,
    #[serde(rename = "type")]
    pub train_type: String,
    pub platform: u32,
}

#[derive(Debug, Serialize)]
pub struct PredictionRequest {
    pub trains: Vec<TrainData>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}
