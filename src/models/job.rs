use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an analysis job in the async pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed,
}

/// One submitted video analysis request and its lifecycle state.
///
/// The result fields (`correct_reps`, `wrong_reps`, `feedback`) are all
/// `None` while the job is pending and all `Some` once completed; the
/// database enforces the same shape with a CHECK constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub id: i64,
    pub user_id: i64,
    pub exercise_name: String,
    pub video_url: String,
    pub status: JobStatus,
    pub correct_reps: Option<i32>,
    pub wrong_reps: Option<i32>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisJob {
    /// Whether a stored completed job carries exactly this result payload.
    pub fn has_result(&self, correct_reps: i32, wrong_reps: i32, feedback: &str) -> bool {
        self.correct_reps == Some(correct_reps)
            && self.wrong_reps == Some(wrong_reps)
            && self.feedback.as_deref() == Some(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_job() -> AnalysisJob {
        AnalysisJob {
            id: 1,
            user_id: 7,
            exercise_name: "Squat".to_string(),
            video_url: "http://cdn/video1.mp4".to_string(),
            status: JobStatus::Completed,
            correct_reps: Some(6),
            wrong_reps: Some(0),
            feedback: Some("Great form".to_string()),
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn identical_result_matches() {
        let job = completed_job();
        assert!(job.has_result(6, 0, "Great form"));
    }

    #[test]
    fn divergent_result_does_not_match() {
        let job = completed_job();
        assert!(!job.has_result(5, 1, "Great form"));
        assert!(!job.has_result(6, 0, "Knees caving in"));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
