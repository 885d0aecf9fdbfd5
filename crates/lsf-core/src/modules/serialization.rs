//! Persisted model records: the structural round-trip surface of a fitted
//! LSF model.

use crate::domain::{LinearParams, LsfError, LsfResult, Pose};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk form of a parameterized model. Field names match the persisted
/// document exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub params_linear: LinearParams,
    pub pose: Pose,
    pub slice: usize,
    pub config: String,
    #[serde(rename = "detID")]
    pub det_id: u32,
    pub nb_line: usize,
    pub normal: bool,
    pub flatfield: bool,
}

/// Canonical text form: LF line endings and a trailing newline.
pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_model_record(path: &Path, record: &ModelRecord) -> LsfResult<()> {
    let rendered = serde_json::to_string_pretty(record).map_err(|source| {
        LsfError::internal(
            "MODEL.RECORD_ENCODE",
            format!("failed to encode model record: {source}"),
        )
    })?;
    fs::write(path, normalize_text_artifact(&rendered)).map_err(|source| {
        LsfError::io_system(
            "IO.MODEL_RECORD_WRITE",
            format!(
                "failed to write model record '{}': {}",
                path.display(),
                source
            ),
        )
    })
}

pub fn read_model_record(path: &Path) -> LsfResult<ModelRecord> {
    let source = fs::read_to_string(path).map_err(|source| {
        LsfError::io_system(
            "IO.MODEL_RECORD_READ",
            format!(
                "failed to read model record '{}': {}",
                path.display(),
                source
            ),
        )
    })?;
    serde_json::from_str(&source).map_err(|source| {
        LsfError::input_validation(
            "INPUT.MODEL_RECORD_FORMAT",
            format!(
                "model record '{}' is malformed: {}",
                path.display(),
                source
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{ModelRecord, normalize_text_artifact, read_model_record, write_model_record};
    use crate::domain::{LinearParams, Pose};
    use tempfile::TempDir;

    fn sample_record() -> ModelRecord {
        let mut params = LinearParams::default();
        params.insert("Amplitude", 1.25e-3, 0.5);
        params.insert("Mean", -2.0e-6, 1.0e-4);
        params.insert("Sigma", 3.5e-5, 2.0e-4);
        ModelRecord {
            name: "GAUSSIAN_MODEL".to_string(),
            params_linear: params,
            pose: Pose::Oversampled,
            slice: 12,
            config: "HK".to_string(),
            det_id: 3,
            nb_line: 140,
            normal: true,
            flatfield: false,
        }
    }

    #[test]
    fn record_round_trips_bit_identically() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("model.json");
        let record = sample_record();

        write_model_record(&path, &record).unwrap();
        let restored = read_model_record(&path).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn written_record_uses_persisted_field_names() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("model.json");
        write_model_record(&path, &sample_record()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"detID\": 3"));
        assert!(text.contains("\"pose\": \"oversampled\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        assert_eq!(normalize_text_artifact("a\r\nb\rc"), "a\nb\nc\n");
    }
}
