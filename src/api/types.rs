use serde::{Deserialize, Serialize};

use crate::models::{CheckpointId, OptionId, VideoId};

/// Body of `POST /api/progress/update`. Absent fields are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub video_id: VideoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ProgressUpdate {
    pub fn position(video_id: VideoId, current_time: f64) -> Self {
        Self {
            video_id,
            current_time: Some(current_time),
            completed: None,
        }
    }

    pub fn completion(video_id: VideoId) -> Self {
        Self {
            video_id,
            current_time: None,
            completed: Some(true),
        }
    }

    pub fn is_completion(&self) -> bool {
        self.completed == Some(true)
    }
}

/// Body of `POST /api/quiz-results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub quiz_id: CheckpointId,
    pub option_id: OptionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_update_omits_absent_fields() {
        let position = ProgressUpdate::position(VideoId::from("v1"), 15.0);
        assert_eq!(
            serde_json::to_value(&position).unwrap(),
            json!({"videoId": "v1", "currentTime": 15.0})
        );

        let done = ProgressUpdate::completion(VideoId::from("v1"));
        assert!(done.is_completion());
        assert_eq!(
            serde_json::to_value(&done).unwrap(),
            json!({"videoId": "v1", "completed": true})
        );
    }

    #[test]
    fn test_answer_request_wire_names() {
        let request = AnswerRequest {
            quiz_id: CheckpointId::from("q1"),
            option_id: OptionId::from("opt-a"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"quizId": "q1", "optionId": "opt-a"})
        );
    }
}
