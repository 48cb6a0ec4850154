use quizgate::models::{Checkpoint, Lesson, QuizOption, VideoId};
use serde_json::{Value, json};

pub struct Fixtures;

impl Fixtures {
    /// Ten minute lecture with checkpoints at 2:00 and 5:00.
    pub fn lecture() -> Lesson {
        Lesson {
            id: VideoId::from("lecture-1"),
            title: "Cell biology, part 1".to_string(),
            description: None,
            url: "https://cdn.example.com/lectures/cells-1.mp4".to_string(),
            video_type: None,
            duration: 600.0,
            quizzes: Vec::new(),
        }
    }

    pub fn lecture_checkpoints() -> Vec<Checkpoint> {
        vec![
            Self::checkpoint("q-120", 120.0, "What is the basic unit of life?", "opt-a"),
            Self::checkpoint("q-300", 300.0, "Which organelle stores DNA?", "opt-c"),
        ]
    }

    pub fn checkpoint(id: &str, trigger_time: f64, question: &str, correct: &str) -> Checkpoint {
        let options = ["opt-a", "opt-b", "opt-c"]
            .iter()
            .map(|option| QuizOption::new(*option, option.to_uppercase(), *option == correct))
            .collect();
        Checkpoint::new(id, trigger_time, question, options)
    }

    /// Lesson record as the backend serves it, with a relative upload URL.
    pub fn lesson_json(id: &str, duration: f64) -> Value {
        json!({
            "id": id,
            "title": "Uploaded lecture",
            "url": "/uploads/lecture.mp4",
            "videoType": null,
            "duration": duration
        })
    }

    pub fn quizzes_json() -> Value {
        json!([
            {
                "id": "quiz-1",
                "timestamp": 30,
                "question": "Ready?",
                "options": [
                    { "id": "yes", "text": "Yes", "isCorrect": true },
                    { "id": "no", "text": "No", "isCorrect": false }
                ]
            },
            {
                "id": "broken",
                "timestamp": 40,
                "question": "Only one option",
                "options": [{ "id": "solo", "text": "Solo", "isCorrect": true }]
            }
        ])
    }
}
