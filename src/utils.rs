/// Utility functions
use serde_json::Value;

/// Parse a 24h `HH:MM` clock time into `(hours, minutes)`
pub fn parse_eta(eta: &str) -> Option<(u32, u32)> {
    let (h, m) = eta.trim().split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some((hours, minutes))
}

/// Pull an ETA earlier by `reduction` minutes, touching the minute field only.
///
/// Minutes saturate at zero and the hour never borrows, so `"15:05"` minus 12
/// gives `"15:00"`. The hour is printed unpadded. Both quirks match the output
/// the dashboard already consumes.
pub fn reduce_eta_minutes(eta: &str, reduction: u32) -> Option<String> {
    let (hours, minutes) = parse_eta(eta)?;
    Some(format!("{}:{:02}", hours, minutes.saturating_sub(reduction)))
}

/// Extract a non-negative integer from JSON value
pub fn uint(v: &Value) -> Option<u32> {
    if let Some(x) = v.as_u64() {
        return u32::try_from(x).ok();
    }
    if let Some(x) = v.as_f64() {
        if x.is_finite() && x >= 0.0 && x <= f64::from(u32::MAX) {
            return Some(x.trunc() as u32);
        }
        return None;
    }
    if let Some(s) = v.as_str() {
        return s.trim().parse::<u32>().ok();
    }
    None
}

/// Pick string value from JSON by trying multiple keys
pub fn s_pick(v: &Value, keys: &[&str]) -> Option<String> {
    for k in keys {
        if let Some(x) = v.get(*k) {
            if let Some(s) = x.as_str() {
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            } else if x.is_number() {
                return Some(x.to_string());
            }
        }
    }
    None
}

/// Pick non-negative integer value from JSON by trying multiple keys
pub fn u_pick(v: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|k| v.get(*k).and_then(uint))
}

/// Pick a list of strings; non-string entries are dropped
pub fn list_pick(v: &Value, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter().find_map(|k| {
        v.get(*k).and_then(|x| x.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|e| e.as_str().map(str::to_string))
                .collect()
        })
    })
}
