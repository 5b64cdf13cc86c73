/// Request normalization: fleet + form parameters into a model-ready request
use crate::domain::{AnalysisParams, ModelInput, RecommendationRequest, TrainRecord, TrainSelection};
use crate::errors::{ApiError, ApiResult};
use std::collections::HashSet;
use tracing::debug;

/// Offsets the dashboard never computes; always sent as zero.
const DEFAULT_REL_OFFSET: i64 = 0;
const DEFAULT_PLATFORM: u32 = 1;

/// Resolve a selection against the fleet.
///
/// Explicit numbers keep their given order, drop duplicates, and skip numbers
/// the store does not know. `All` and `DelayedOnly` follow store order.
pub fn select<'a>(trains: &'a [TrainRecord], selection: &TrainSelection) -> Vec<&'a TrainRecord> {
    match selection {
        TrainSelection::All => trains.iter().collect(),
        TrainSelection::DelayedOnly => trains.iter().filter(|t| t.delay > 0).collect(),
        TrainSelection::Numbers { numbers } => {
            let mut seen = HashSet::new();
            numbers
                .iter()
                .filter(|n| seen.insert(n.as_str()))
                .filter_map(|n| {
                    let found = trains.iter().find(|t| &t.number == n);
                    if found.is_none() {
                        debug!("Selected train {} is not in the store, skipping", n);
                    }
                    found
                })
                .collect()
        }
    }
}

pub fn to_model_input(train: &TrainRecord) -> ModelInput {
    ModelInput {
        id: train.number.clone(),
        train_type: train.train_type.as_str().to_lowercase(),
        rel_arrival: DEFAULT_REL_OFFSET,
        rel_departure: DEFAULT_REL_OFFSET,
        delay: train.delay,
        passengers: train.passengers,
        platform: DEFAULT_PLATFORM,
    }
}

/// Build the request. An empty selection is allowed here; running it is not.
pub fn normalize(trains: &[TrainRecord], params: AnalysisParams) -> ApiResult<RecommendationRequest> {
    for (name, value) in params.priority_weights.as_pairs() {
        if value > 100 {
            return Err(ApiError::Validation(format!(
                "priority weight {} must be within 0..=100, got {}",
                name, value
            )));
        }
    }

    let inputs = select(trains, &params.selection)
        .into_iter()
        .map(to_model_input)
        .collect();

    Ok(RecommendationRequest {
        trains: inputs,
        optimization_goal: params.optimization_goal,
        time_horizon: params.time_horizon,
        weather_conditions: params.weather_conditions,
        special_events: params.special_events,
        priority_weights: params.priority_weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptimizationGoal, PriorityWeights, TimeHorizon, WeatherConditions};
    use crate::repo::TrainStore;

    fn params(selection: TrainSelection) -> AnalysisParams {
        AnalysisParams {
            selection,
            optimization_goal: OptimizationGoal::OptimizeFuel,
            time_horizon: TimeHorizon::FourHours,
            weather_conditions: WeatherConditions::Fog,
            special_events: "Platform 3 closed".to_string(),
            priority_weights: PriorityWeights::default(),
        }
    }

    #[test]
    fn test_model_input_projection() {
        let trains = TrainStore::seeded().snapshot();
        let input = to_model_input(&trains[1]);
        assert_eq!(
            input,
            ModelInput {
                id: "12002".to_string(),
                train_type: "express".to_string(),
                rel_arrival: 0,
                rel_departure: 0,
                delay: 15,
                passengers: 891,
                platform: 1,
            }
        );
    }

    #[test]
    fn test_delayed_only_selection() {
        let trains = TrainStore::seeded().snapshot();
        let request = normalize(&trains, params(TrainSelection::DelayedOnly)).unwrap();
        let ids: Vec<_> = request.trains.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["12002", "GDS456"]);
        assert_eq!(request.trains[1].train_type, "goods");
    }

    #[test]
    fn test_select_all() {
        let trains = TrainStore::seeded().snapshot();
        let request = normalize(&trains, params(TrainSelection::All)).unwrap();
        assert_eq!(request.trains.len(), 4);
        assert_eq!(request.optimization_goal, OptimizationGoal::OptimizeFuel);
        assert_eq!(request.special_events, "Platform 3 closed");
    }

    #[test]
    fn test_explicit_numbers_keep_order_and_skip_unknown() {
        let trains = TrainStore::seeded().snapshot();
        let selection = TrainSelection::Numbers {
            numbers: vec![
                "12624".to_string(),
                "99999".to_string(),
                "12301".to_string(),
                "12624".to_string(),
            ],
        };
        let request = normalize(&trains, params(selection)).unwrap();
        let ids: Vec<_> = request.trains.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["12624", "12301"]);
    }

    #[test]
    fn test_empty_selection_normalizes_to_empty_request() {
        let trains = TrainStore::seeded().snapshot();
        let request = normalize(
            &trains,
            params(TrainSelection::Numbers { numbers: vec![] }),
        )
        .unwrap();
        assert!(request.trains.is_empty());
    }

    #[test]
    fn test_weight_out_of_range_is_rejected() {
        let trains = TrainStore::seeded().snapshot();
        let mut p = params(TrainSelection::All);
        p.priority_weights.fuel_efficiency = 101;
        let err = normalize(&trains, p).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("fuelEfficiency")));
    }

    #[test]
    fn test_large_weight_parses_then_fails_validation() {
        let trains = TrainStore::seeded().snapshot();
        let p: AnalysisParams = serde_json::from_value(serde_json::json!({
            "selection": {"mode": "all"},
            "priorityWeights": {
                "onTime": 80, "passengerComfort": 60,
                "fuelEfficiency": 40, "trackUtilization": 1000
            }
        }))
        .unwrap();
        assert_eq!(p.priority_weights.track_utilization, 1000);

        let err = normalize(&trains, p).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("trackUtilization")));
    }
}
