use garde::Validate;
use serde::{Deserialize, Serialize};

/// Request to submit a video for analysis.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVideoRequest {
    #[garde(length(min = 1, max = 200))]
    pub exercise_name: String,

    #[garde(length(min = 1, max = 512))]
    pub video_url: String,
}

/// Completion report posted back by an analysis worker.
///
/// `job_id` is the correlation key the worker received in the queue message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResultRequest {
    #[garde(skip)]
    pub job_id: i64,

    #[garde(range(min = 0))]
    pub correct_reps: i32,

    #[garde(range(min = 0))]
    pub wrong_reps: i32,

    #[garde(skip)]
    pub feedback: String,
}

/// Acknowledgement returned to the worker after result intake.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultAck {
    pub job_id: i64,
    pub status: String,
}

/// Completed-job count for one exercise name.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCategory {
    pub exercise_name: String,
    pub completed_count: i64,
}

/// Aggregate over all of a user's completed jobs.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_completed_videos: i64,
    pub total_correct_reps: i64,
    pub total_wrong_reps: i64,
    pub overall_accuracy: f64,
}

/// Pagination and filter parameters for the completed-jobs listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListParams {
    pub exercise_name: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_rejects_empty_fields() {
        let empty_exercise = SubmitVideoRequest {
            exercise_name: String::new(),
            video_url: "http://x/video1".to_string(),
        };
        assert!(empty_exercise.validate().is_err());

        let empty_url = SubmitVideoRequest {
            exercise_name: "Squat".to_string(),
            video_url: String::new(),
        };
        assert!(empty_url.validate().is_err());

        let valid = SubmitVideoRequest {
            exercise_name: "Squat".to_string(),
            video_url: "http://x/video1".to_string(),
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn result_request_rejects_negative_reps() {
        let request = AnalysisResultRequest {
            job_id: 1,
            correct_reps: -1,
            wrong_reps: 0,
            feedback: "bad counter".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn result_request_parses_worker_payload() {
        let payload = r#"{"jobId":5,"correctReps":6,"wrongReps":0,"feedback":"Great form"}"#;
        let request: AnalysisResultRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(request.job_id, 5);
        assert_eq!(request.correct_reps, 6);
        assert!(request.validate().is_ok());
    }
}
