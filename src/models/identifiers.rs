use serde::{Deserialize, Serialize};
use std::fmt;

/// String ids exactly as the lesson backend sends them.
macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

wire_id!(
    /// A lecture video, used in every API path and progress report.
    VideoId
);
wire_id!(
    /// A quiz checkpoint; the key of the answered set.
    CheckpointId
);
wire_id!(OptionId);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_plain_json_strings() {
        let video = VideoId::from("lecture-42");
        assert_eq!(serde_json::to_value(&video).unwrap(), json!("lecture-42"));

        let option: OptionId = serde_json::from_value(json!("opt-b")).unwrap();
        assert_eq!(option, OptionId::new("opt-b"));
        assert_eq!(option.to_string(), "opt-b");
    }

    #[test]
    fn test_ids_inside_wire_structs() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Answer {
            checkpoint_id: CheckpointId,
            option_id: OptionId,
        }

        let answer: Answer =
            serde_json::from_value(json!({"checkpointId": "q-120", "optionId": "opt-a"})).unwrap();
        assert_eq!(answer.checkpoint_id.as_str(), "q-120");
        assert_eq!(answer.option_id, OptionId::from(String::from("opt-a")));
    }

    #[test]
    fn test_checkpoint_ids_dedupe_in_sets() {
        let mut answered = HashSet::new();
        assert!(answered.insert(CheckpointId::from("q-120")));
        assert!(!answered.insert(CheckpointId::new(String::from("q-120"))));
        assert!(answered.insert(CheckpointId::from("q-300")));
        assert_eq!(answered.len(), 2);
    }
}
