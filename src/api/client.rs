use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::errors::ApiError;
use super::types::{AnswerRequest, AnswerResponse, ProgressUpdate};
use super::LessonApi;
use crate::config::ApiConfig;
use crate::models::{Checkpoint, CheckpointId, Lesson, OptionId, ResumePoint, VideoId};

/// HTTP implementation of [`LessonApi`].
#[derive(Clone)]
pub struct LessonApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl LessonApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }
        // Joined paths must extend the base rather than replace its last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(Self::standard_headers(config.session_cookie.as_deref())?)
            .build()
            .map_err(|e| ApiError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn standard_headers(session_cookie: Option<&str>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ApiError::Other(format!("Invalid session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        Ok(headers)
    }

    /// `base_url` + `api/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), body))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;
        let response = Self::check(response).await?;
        let body = response.text().await.map_err(ApiError::from_reqwest)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl LessonApi for LessonApiClient {
    async fn fetch_lesson(&self, video_id: &VideoId) -> Result<Lesson, ApiError> {
        let url = self.endpoint(&["videos", video_id.as_str()])?;
        self.get_json(url).await
    }

    async fn fetch_checkpoints(&self, video_id: &VideoId) -> Result<Vec<Checkpoint>, ApiError> {
        let url = self.endpoint(&["videos", video_id.as_str(), "quizzes"])?;
        let checkpoints: Vec<Checkpoint> = self.get_json(url).await?;
        debug!(
            "Fetched {} checkpoint(s) for video {}",
            checkpoints.len(),
            video_id
        );
        Ok(checkpoints)
    }

    async fn fetch_resume(&self, video_id: &VideoId) -> Result<ResumePoint, ApiError> {
        let url = self.endpoint(&["progress", video_id.as_str()])?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("No saved progress for video {}", video_id);
            return Ok(ResumePoint::default());
        }

        let response = Self::check(response).await?;
        let body = response.text().await.map_err(ApiError::from_reqwest)?;
        if body.trim().is_empty() {
            return Ok(ResumePoint::default());
        }
        let resume: Option<ResumePoint> = serde_json::from_str(&body)?;
        Ok(resume.unwrap_or_default())
    }

    async fn report_progress(&self, update: &ProgressUpdate) -> Result<(), ApiError> {
        let url = self.endpoint(&["progress", "update"])?;
        let response = self
            .client
            .post(url)
            .json(update)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn submit_answer(
        &self,
        checkpoint_id: &CheckpointId,
        option_id: &OptionId,
    ) -> Result<bool, ApiError> {
        let url = self.endpoint(&["quiz-results"])?;
        let request = AnswerRequest {
            quiz_id: checkpoint_id.clone(),
            option_id: option_id.clone(),
        };
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;
        let response = Self::check(response).await?;
        let body = response.text().await.map_err(ApiError::from_reqwest)?;
        let verdict: AnswerResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Unexpected answer response: {}", body);
            ApiError::from(e)
        })?;
        Ok(verdict.is_correct)
    }
}
