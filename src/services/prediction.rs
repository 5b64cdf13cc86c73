/// Relay of departure inputs to the backend priority predictor
use crate::clients::PredictorClient;
use crate::domain::{DepartureInput, PredictionRequest, PredictionResponse, TrainData};
use crate::errors::{ApiError, ApiResult};
use chrono::Utc;
use tracing::info;

const DEFAULT_DEPARTURE_TIME: &str = "00:00";
const DEFAULT_DESTINATION: &str = "Destination Station";

/// Keep complete rows (train id and type filled) and map them to the predictor's shape
pub fn to_train_data(inputs: &[DepartureInput]) -> Vec<TrainData> {
    inputs
        .iter()
        .filter(|i| !i.train_id.trim().is_empty() && !i.train_type.trim().is_empty())
        .map(|i| TrainData {
            train_id: i.train_id.clone(),
            departure_time: if i.departure_time.trim().is_empty() {
                DEFAULT_DEPARTURE_TIME.to_string()
            } else {
                i.departure_time.clone()
            },
            destination: DEFAULT_DESTINATION.to_string(),
            delay: i.delay,
            passengers: i.passenger_count,
            train_type: i.train_type.clone(),
            platform: i.platform,
        })
        .collect()
}

#[derive(Debug)]
pub struct PredictionService {
    client: PredictorClient,
}

impl PredictionService {
    pub fn new(client: PredictorClient) -> Self {
        Self { client }
    }

    /// Failures are surfaced to the caller; there is no fallback here.
    pub async fn submit(&self, inputs: &[DepartureInput]) -> ApiResult<PredictionResponse> {
        let trains = to_train_data(inputs);
        if trains.is_empty() {
            return Err(ApiError::Validation(
                "fill at least one complete departure input".to_string(),
            ));
        }

        info!("Sending {} trains to the predictor", trains.len());
        let request = PredictionRequest {
            trains,
            timestamp: Utc::now(),
        };
        let response = self.client.predict(&request).await?;
        info!("Predictor answered priority {}", response.priority);
        Ok(response)
    }
}
