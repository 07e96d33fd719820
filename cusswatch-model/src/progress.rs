use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analysis::AnalysisResult;

/// One record in the ordered progress sequence a pipeline run emits.
///
/// Consumers may receive these incrementally (SSE) or only observe the
/// terminal `Complete`/`Error` record; both delivery modes are valid.
///
/// The wire shape tags every record with a `step` field: the numbered
/// stages carry it as a JSON number (`{"step": 0, "message": ...}`), the
/// terminal records as a string (`"complete"` / `"error"`). Serde's
/// internal tagging only supports string tags, so the impls are manual.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Searching { message: String },
    Downloading { message: String },
    Parsing { message: String },
    Classifying { message: String },
    Categorizing { message: String },
    Complete { result: Box<AnalysisResult> },
    Error { error: String },
}

impl Serialize for ProgressEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Self::Searching { message } => {
                map.serialize_entry("step", &0u8)?;
                map.serialize_entry("message", message)?;
            }
            Self::Downloading { message } => {
                map.serialize_entry("step", &1u8)?;
                map.serialize_entry("message", message)?;
            }
            Self::Parsing { message } => {
                map.serialize_entry("step", &2u8)?;
                map.serialize_entry("message", message)?;
            }
            Self::Classifying { message } => {
                map.serialize_entry("step", &3u8)?;
                map.serialize_entry("message", message)?;
            }
            Self::Categorizing { message } => {
                map.serialize_entry("step", &4u8)?;
                map.serialize_entry("message", message)?;
            }
            Self::Complete { result } => {
                map.serialize_entry("step", "complete")?;
                map.serialize_entry("result", result)?;
            }
            Self::Error { error } => {
                map.serialize_entry("step", "error")?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

#[derive(Deserialize)]
enum CompleteTag {
    #[serde(rename = "complete")]
    Complete,
}

#[derive(Deserialize)]
enum ErrorTag {
    #[serde(rename = "error")]
    Error,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireEvent {
    Numbered {
        step: u8,
        message: String,
    },
    Complete {
        #[allow(dead_code)]
        step: CompleteTag,
        result: Box<AnalysisResult>,
    },
    Error {
        #[allow(dead_code)]
        step: ErrorTag,
        error: String,
    },
}

impl<'de> Deserialize<'de> for ProgressEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireEvent::deserialize(deserializer)? {
            WireEvent::Numbered { step, message } => match step {
                0 => Ok(Self::Searching { message }),
                1 => Ok(Self::Downloading { message }),
                2 => Ok(Self::Parsing { message }),
                3 => Ok(Self::Classifying { message }),
                4 => Ok(Self::Categorizing { message }),
                other => {
                    Err(D::Error::custom(format!("unknown step {other}")))
                }
            },
            WireEvent::Complete { result, .. } => Ok(Self::Complete { result }),
            WireEvent::Error { error, .. } => Ok(Self::Error { error }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_stages_carry_numeric_step_tags() {
        let event = ProgressEvent::Searching {
            message: "Searching for subtitles".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["step"], serde_json::json!(0));
        assert_eq!(value["message"], "Searching for subtitles");

        let event = ProgressEvent::Categorizing {
            message: "Categorizing results".to_string(),
        };
        assert_eq!(serde_json::to_value(&event).unwrap()["step"], 4);
    }

    #[test]
    fn terminal_records_carry_string_step_tags() {
        let event = ProgressEvent::Error {
            error: "no subtitles found".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["step"], "error");
        assert_eq!(value["error"], "no subtitles found");
    }

    #[test]
    fn numeric_steps_round_trip() {
        let event = ProgressEvent::Downloading {
            message: "Downloading subtitle file".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn out_of_range_step_is_rejected() {
        let err =
            serde_json::from_str::<ProgressEvent>(r#"{"step":9,"message":"x"}"#);
        assert!(err.is_err());
    }
}
