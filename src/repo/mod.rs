/// Repository layer: in-memory Train Record Store
use crate::domain::{Priority, TrainRecord, TrainStatus, TrainType, Zone};
use crate::errors::{ApiError, ApiResult};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Current fleet snapshot, shared between handlers and the lifecycle manager
#[derive(Clone, Debug, Default)]
pub struct TrainStore {
    trains: Arc<RwLock<Vec<TrainRecord>>>,
}

impl TrainStore {
    pub fn new(trains: Vec<TrainRecord>) -> Self {
        Self {
            trains: Arc::new(RwLock::new(trains)),
        }
    }

    /// Store preloaded with the dashboard's starting fleet
    pub fn seeded() -> Self {
        Self::new(seed_trains())
    }

    /// Copy of every record, in store order
    pub fn snapshot(&self) -> Vec<TrainRecord> {
        self.trains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records in a zone, or all of them
    pub fn list(&self, zone: Option<Zone>) -> Vec<TrainRecord> {
        let trains = self.trains.read().unwrap_or_else(PoisonError::into_inner);
        trains
            .iter()
            .filter(|t| zone.map_or(true, |z| t.zone == z))
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub fn find_by_id(&self, id: &str) -> Option<TrainRecord> {
        let trains = self.trains.read().unwrap_or_else(PoisonError::into_inner);
        trains.iter().find(|t| t.id == id).cloned()
    }

    /// Mutate one record in place; `None` if the id is gone
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut TrainRecord) -> R) -> Option<R> {
        let mut trains = self.trains.write().unwrap_or_else(PoisonError::into_inner);
        trains.iter_mut().find(|t| t.id == id).map(f)
    }

    /// Replace the whole fleet (the dashboard's data-management update).
    ///
    /// Ids and public numbers must both be unique; a fleet that repeats
    /// either is refused and the current one is kept.
    pub fn replace_all(&self, trains: Vec<TrainRecord>) -> ApiResult<usize> {
        let mut ids = HashSet::new();
        let mut numbers = HashSet::new();
        for train in &trains {
            if !ids.insert(train.id.as_str()) {
                return Err(ApiError::Validation(format!("duplicate train id {}", train.id)));
            }
            if !numbers.insert(train.number.as_str()) {
                return Err(ApiError::Validation(format!(
                    "duplicate train number {}",
                    train.number
                )));
            }
        }

        let count = trains.len();
        *self.trains.write().unwrap_or_else(PoisonError::into_inner) = trains;
        Ok(count)
    }
}

#[allow(clippy::too_many_arguments)]
fn train(
    id: &str,
    name: &str,
    number: &str,
    route: &str,
    zone: Zone,
    status: &str,
    current_location: &str,
    next_station: &str,
    eta: &str,
    delay: u32,
    passengers: u32,
    priority: Priority,
    train_type: &str,
) -> TrainRecord {
    TrainRecord {
        id: id.to_string(),
        name: name.to_string(),
        number: number.to_string(),
        route: route.to_string(),
        zone,
        status: TrainStatus::from(status.to_string()),
        current_location: current_location.to_string(),
        next_station: next_station.to_string(),
        eta: eta.to_string(),
        delay,
        passengers,
        priority,
        train_type: TrainType::from(train_type.to_string()),
    }
}

fn seed_trains() -> Vec<TrainRecord> {
    vec![
        train(
            "T001",
            "Rajdhani Express",
            "12301",
            "NEW DELHI → MUMBAI CENTRAL",
            Zone::Western,
            "On Time",
            "Mathura Junction",
            "Agra Cantt",
            "14:30",
            0,
            1247,
            Priority::High,
            "Express",
        ),
        train(
            "T002",
            "Shatabdi Express",
            "12002",
            "NEW DELHI → CHANDIGARH",
            Zone::Northern,
            "Delayed",
            "Ambala Cantt",
            "Chandigarh",
            "15:45",
            15,
            891,
            Priority::High,
            "Express",
        ),
        train(
            "T003",
            "Chennai Express",
            "12624",
            "NEW DELHI → CHENNAI CENTRAL",
            Zone::Southern,
            "On Time",
            "Vijayawada Junction",
            "Gudur Junction",
            "22:15",
            0,
            1456,
            Priority::Medium,
            "Express",
        ),
        train(
            "T004",
            "Goods Train",
            "GDS456",
            "MUMBAI PORT → DELHI",
            Zone::Central,
            "Moving",
            "Bhopal Junction",
            "Jhansi Junction",
            "18:30",
            5,
            0,
            Priority::Low,
            "Goods",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_fleet() {
        let store = TrainStore::seeded();
        let trains = store.snapshot();
        assert_eq!(trains.len(), 4);
        assert_eq!(trains[1].number, "12002");
        assert_eq!(trains[1].delay, 15);
        assert_eq!(trains[3].train_type, TrainType::Other("Goods".to_string()));
    }

    #[test]
    fn test_list_by_zone() {
        let store = TrainStore::seeded();
        let northern = store.list(Some(Zone::Northern));
        assert_eq!(northern.len(), 1);
        assert_eq!(northern[0].id, "T002");
        assert!(store.list(Some(Zone::NorthEastern)).is_empty());
        assert_eq!(store.list(None).len(), 4);
    }

    #[test]
    fn test_update_existing_and_missing() {
        let store = TrainStore::seeded();
        let delay = store.update("T002", |t| {
            t.delay = 3;
            t.delay
        });
        assert_eq!(delay, Some(3));
        assert_eq!(store.find_by_id("T002").map(|t| t.delay), Some(3));
        assert_eq!(store.update("T999", |t| t.delay = 0), None);
    }

    #[test]
    fn test_clones_share_state() {
        let store = TrainStore::seeded();
        let other = store.clone();
        assert_eq!(other.replace_all(Vec::new()).unwrap(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_replace_refuses_repeated_number() {
        let store = TrainStore::seeded();
        let mut fleet = store.snapshot();
        let mut copy = fleet[1].clone();
        copy.id = "T009".to_string();
        fleet.push(copy);

        let err = store.replace_all(fleet).unwrap_err();

        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("12002")));
        assert_eq!(store.snapshot(), TrainStore::seeded().snapshot());
    }

    #[test]
    fn test_replace_refuses_repeated_id() {
        let store = TrainStore::seeded();
        let mut fleet = store.snapshot();
        let mut copy = fleet[0].clone();
        copy.number = "99999".to_string();
        fleet.push(copy);

        let err = store.replace_all(fleet).unwrap_err();

        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("T001")));
        assert_eq!(store.snapshot().len(), 4);
    }
}
