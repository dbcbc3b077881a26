// record.rs - Portable recording record handed to the external store

use serde::{Deserialize, Serialize};

use crate::history::HistoryFrame;
use crate::rules::{CustomRules, RuleSet};

/// Studio settings in effect when a recording was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSettings {
    pub cell_size: u32,
    pub rows: usize,
    pub cols: usize,
    /// Generations per second.
    pub speed: f64,
    pub custom_rules: CustomRules,
}

impl RecordingSettings {
    pub fn rules(&self) -> RuleSet {
        RuleSet::from(&self.custom_rules)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    pub total_generations: usize,
    /// Milliseconds between the first and last frame.
    pub duration: u64,
    pub rule_string: String,
}

impl RecordingMetadata {
    /// Derive metadata for a contiguous run of frames.
    pub fn describe(frames: &[HistoryFrame], rule_string: impl Into<String>) -> Self {
        let duration = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) => last
                .timestamp_offset_ms
                .saturating_sub(first.timestamp_offset_ms),
            _ => 0,
        };
        Self {
            total_generations: frames.len(),
            duration,
            rule_string: rule_string.into(),
        }
    }
}

/// Exact shape persisted by the recording store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub generations: Vec<HistoryFrame>,
    pub settings: RecordingSettings,
    pub metadata: RecordingMetadata,
}

impl RecordingRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::grid::CellGrid;

    fn sample() -> RecordingRecord {
        let frames = vec![
            HistoryFrame {
                timestamp_offset_ms: 0,
                generation: 1,
                grid: CellGrid::parse(&["#.", ".."]).unwrap(),
                population: 1,
            },
            HistoryFrame {
                timestamp_offset_ms: 250,
                generation: 2,
                grid: CellGrid::parse(&["..", ".."]).unwrap(),
                population: 0,
            },
        ];
        let metadata = RecordingMetadata::describe(&frames, "B3/S23");
        RecordingRecord {
            generations: frames,
            settings: RecordingSettings {
                cell_size: 10,
                rows: 2,
                cols: 2,
                speed: 4.0,
                custom_rules: RuleSet::CONWAY.into(),
            },
            metadata,
        }
    }

    #[test]
    fn json_shape_matches_the_store_format() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "generations": [
                    { "timestampOffsetMs": 0, "generation": 1, "grid": [[true, false], [false, false]], "population": 1 },
                    { "timestampOffsetMs": 250, "generation": 2, "grid": [[false, false], [false, false]], "population": 0 }
                ],
                "settings": {
                    "cellSize": 10,
                    "rows": 2,
                    "cols": 2,
                    "speed": 4.0,
                    "customRules": { "birthRules": [3], "survivalRules": [2, 3] }
                },
                "metadata": { "totalGenerations": 2, "duration": 250, "ruleString": "B3/S23" }
            })
        );
        assert!(value["generations"][0].get("timestamp_offset_ms").is_none());
        assert_eq!(value["metadata"]["duration"], Value::from(250));
    }

    #[test]
    fn json_round_trip() {
        let record = sample();
        let raw = record.to_json().unwrap();
        assert_eq!(RecordingRecord::from_json(&raw).unwrap(), record);
        assert_eq!(record.settings.rules(), RuleSet::CONWAY);
    }

    #[test]
    fn ragged_grid_is_rejected() {
        let raw = r#"{
            "generations": [{ "timestampOffsetMs": 0, "generation": 0, "grid": [[true], [true, false]], "population": 2 }],
            "settings": { "cellSize": 1, "rows": 2, "cols": 2, "speed": 1.0, "customRules": { "birthRules": [3], "survivalRules": [2, 3] } },
            "metadata": { "totalGenerations": 1, "duration": 0, "ruleString": "B3/S23" }
        }"#;
        assert!(RecordingRecord::from_json(raw).is_err());
    }
}
