/// Application routes configuration
use crate::handlers::{
    apply_recommendation, export_analysis, get_analysis, get_metrics, health, list_trains,
    predict, preview_analysis, reject_recommendation, replace_trains, run_analysis,
    set_live_metrics, AppState,
};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Fleet
        .route("/trains", get(list_trains).put(replace_trains))
        // Simulated metrics
        .route("/metrics", get(get_metrics))
        .route("/metrics/live", post(set_live_metrics))
        // Analysis workflow
        .route("/analysis", get(get_analysis))
        .route("/analysis/preview", post(preview_analysis))
        .route("/analysis/export", post(export_analysis))
        .route("/analysis/run", post(run_analysis))
        .route("/recommendations/:id/apply", post(apply_recommendation))
        .route("/recommendations/:id/reject", post(reject_recommendation))
        // Backend predictor relay
        .route("/predict", post(predict))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ModelClient, PredictorClient};
    use crate::domain::{ExportedRequest, OptimizationGoal};
    use crate::repo::TrainStore;
    use crate::services::{default_provider, LifecycleManager, MetricsService, PredictionService};
    use axum::Json;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    async fn spawn_app() -> (String, TrainStore) {
        spawn_app_with_model(None).await
    }

    async fn spawn_app_with_model(model_url: Option<String>) -> (String, TrainStore) {
        let store = TrainStore::seeded();
        let model = ModelClient::new(model_url, None, Duration::from_secs(5)).unwrap();
        let predictor = PredictorClient::new(
            "http://127.0.0.1:9/predict".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let state = AppState {
            store: store.clone(),
            lifecycle: Arc::new(LifecycleManager::new(
                default_provider(model, Some(21)),
                store.clone(),
            )),
            metrics: Arc::new(MetricsService::new(false, Some(21))),
            prediction: Arc::new(PredictionService::new(predictor)),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });
        (format!("http://{}", addr), store)
    }

    #[tokio::test]
    async fn test_health() {
        let (base, _) = spawn_app().await;
        let body: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body["now"].is_string());
    }

    #[tokio::test]
    async fn test_trains_zone_filter() {
        let (base, _) = spawn_app().await;
        let client = reqwest::Client::new();

        let body: Value = client
            .get(format!("{}/trains?zone=Northern", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["trains"].as_array().unwrap().len(), 1);
        assert_eq!(body["trains"][0]["number"], "12002");

        let all: Value = client
            .get(format!("{}/trains?zone=All%20Zones", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(all["trains"].as_array().unwrap().len(), 4);

        let bad = client
            .get(format!("{}/trains?zone=Atlantis", base))
            .send()
            .await
            .unwrap();
        assert_eq!(bad.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_empty_selection_returns_validation_error() {
        let (base, _) = spawn_app().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/analysis/run", base))
            .json(&json!({"selection": {"mode": "numbers", "numbers": []}}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let analysis: Value = client
            .get(format!("{}/analysis", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(analysis["summary"]["phase"], "idle");
        assert_eq!(analysis["recommendations"], json!([]));
    }

    #[tokio::test]
    async fn test_run_apply_reject_flow() {
        let (base, store) = spawn_app().await;
        let client = reqwest::Client::new();

        let run: Value = client
            .post(format!("{}/analysis/run", base))
            .json(&json!({"selection": {"mode": "delayed_only"}}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(run["ok"], true);
        assert_eq!(run["source"], "synthetic");
        let recs = run["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["trainId"], "T002");
        assert_eq!(recs[0]["status"], "pending");

        let shatabdi_id = recs[0]["id"].as_str().unwrap().to_string();
        let reduction = recs[0]["recommendedChanges"]["delayReduction"].as_u64().unwrap() as u32;
        let new_eta = recs[0]["recommendedChanges"]["newETA"].as_str().unwrap().to_string();

        let applied: Value = client
            .post(format!("{}/recommendations/{}/apply", base, shatabdi_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(applied["status"], "applied");
        let train = store.find_by_id("T002").unwrap();
        assert_eq!(train.delay, 15u32.saturating_sub(reduction));
        assert_eq!(train.eta, new_eta);

        let again = client
            .post(format!("{}/recommendations/{}/apply", base, shatabdi_id))
            .send()
            .await
            .unwrap();
        assert_eq!(again.status().as_u16(), 409);

        let goods_id = recs[1]["id"].as_str().unwrap();
        let rejected: Value = client
            .post(format!("{}/recommendations/{}/reject", base, goods_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(rejected["status"], "rejected");

        let analysis: Value = client
            .get(format!("{}/analysis", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(analysis["summary"]["phase"], "done");
        assert_eq!(analysis["summary"]["count"], 2);
        assert_eq!(analysis["summary"]["totalDelayReduction"], reduction);
    }

    #[tokio::test]
    async fn test_export_round_trip() {
        let (base, _) = spawn_app().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/analysis/export", base))
            .json(&json!({
                "selection": {"mode": "numbers", "numbers": ["12624", "12002"]},
                "optimizationGoal": "passenger_comfort",
                "specialEvents": "Kumbh Mela crowds",
                "priorityWeights": {
                    "onTime": 10, "passengerComfort": 100,
                    "fuelEfficiency": 0, "trackUtilization": 55
                }
            }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"ai-model-input-"));
        assert!(disposition.ends_with(".json\""));

        let text = resp.text().await.unwrap();
        assert!(text.contains("\n  \"trains\""));
        let exported: ExportedRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(exported.request.optimization_goal, OptimizationGoal::PassengerComfort);
        assert_eq!(exported.request.trains[0].id, "12624");
        assert_eq!(exported.request.priority_weights.passenger_comfort, 100);

        let preview: Value = client
            .post(format!("{}/analysis/preview", base))
            .json(&json!({
                "selection": {"mode": "numbers", "numbers": ["12624", "12002"]},
                "optimizationGoal": "passenger_comfort",
                "specialEvents": "Kumbh Mela crowds",
                "priorityWeights": {
                    "onTime": 10, "passengerComfort": 100,
                    "fuelEfficiency": 0, "trackUtilization": 55
                }
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let mut preview = preview;
        preview.as_object_mut().unwrap().remove("ok");
        assert_eq!(preview, serde_json::to_value(&exported.request).unwrap());

        let reparsed: ExportedRequest =
            serde_json::from_str(&serde_json::to_string_pretty(&exported).unwrap()).unwrap();
        assert_eq!(reparsed, exported);
    }

    #[tokio::test]
    async fn test_metrics_toggle() {
        let (base, _) = spawn_app().await;
        let client = reqwest::Client::new();

        let metrics: Value = client
            .post(format!("{}/metrics/live", base))
            .json(&json!({"enabled": true}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(metrics["live"], true);
        assert_eq!(metrics["trainsOnTime"], 78.0);
    }

    /// Model endpoint that answers with no suggestions after `delay`
    async fn spawn_slow_model(delay: Duration) -> String {
        let app = Router::new().route(
            "/recommend",
            post(move || async move {
                tokio::time::sleep(delay).await;
                Json(json!({"recommendations": []}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });
        format!("http://{}/recommend", addr)
    }

    #[tokio::test]
    async fn test_run_completes_after_client_disconnects() {
        let model_url = spawn_slow_model(Duration::from_millis(400)).await;
        let (base, _) = spawn_app_with_model(Some(model_url)).await;

        let impatient = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let outcome = impatient
            .post(format!("{}/analysis/run", base))
            .json(&json!({"selection": {"mode": "all"}}))
            .send()
            .await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(900)).await;
        let analysis: Value = reqwest::get(format!("{}/analysis", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(analysis["summary"]["phase"], "done");
        assert_eq!(analysis["source"], "remote");
        assert_eq!(analysis["recommendations"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_replace_fleet_with_repeated_number_is_refused() {
        let (base, store) = spawn_app().await;
        let client = reqwest::Client::new();

        let mut fleet = serde_json::to_value(store.snapshot()).unwrap();
        let mut copy = fleet[1].clone();
        copy["id"] = json!("T009");
        fleet.as_array_mut().unwrap().push(copy);

        let resp = client
            .put(format!("{}/trains", base))
            .json(&fleet)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let run: Value = client
            .post(format!("{}/analysis/run", base))
            .json(&json!({"selection": {"mode": "all"}}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let train_ids: Vec<_> = run["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["trainId"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(train_ids, vec!["T001", "T002", "T003", "T004"]);
    }

    #[tokio::test]
    async fn test_oversized_weight_gets_error_envelope() {
        let (base, _) = spawn_app().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/analysis/preview", base))
            .json(&json!({
                "selection": {"mode": "all"},
                "priorityWeights": {
                    "onTime": 300, "passengerComfort": 60,
                    "fuelEfficiency": 40, "trackUtilization": 70
                }
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
