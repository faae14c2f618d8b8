//! Typed consumer client for the exam-prep content service.
//!
//! Mirrors the backend call surface one method per operation. Reads run
//! through the [`cache::QueryCache`] so repeated renders hit the cache,
//! concurrent fetches coalesce, and mutations force refetches by invalidating
//! exactly the keys they affect. Mutation failures are classified on the
//! structured error code carried by the response envelope and remapped to
//! user-facing messages.

pub mod cache;
pub mod gate;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{API_KEY_HEADER, PRINCIPAL_HEADER};
use crate::daykey::{self, DayKey};
use crate::errors::codes;
use crate::models::{
    ContentType, CreateDailyPollutionRequest, CreatePreviousYearPaperRequest,
    CreateStudyMaterialRequest, DailyPollutionEntry, DailyTestSeriesEntry, PreviousYearPaper,
    StudyMaterial, UserProfile, UserRole, MAX_PAPER_YEAR, MIN_PAPER_YEAR,
};
use cache::{QueryCache, QueryKey};

/// Default retry budget for content reads.
const READ_RETRIES: u32 = 3;
/// Profile-type queries are not retried.
const PROFILE_RETRIES: u32 = 0;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Remote connection not established. Reads resolve empty instead of
    /// raising this; writes fail fast with it.
    Unavailable,
    /// A write was rejected because the caller lacks the admin role.
    PermissionDenied(String),
    /// Rejected client-side before any remote call was made.
    Validation(String),
    /// Any other failure, remapped to a try-again message.
    Failed(String),
}

impl ClientError {
    /// Message suitable for a transient user notification.
    pub fn user_message(&self) -> &str {
        match self {
            ClientError::Unavailable => "Service not available. Please try again later.",
            ClientError::PermissionDenied(message)
            | ClientError::Validation(message)
            | ClientError::Failed(message) => message,
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for ClientError {}

/// Classify a remote failure on its machine-readable code, never on message
/// text.
fn classify(code: &str, message: String) -> ClientError {
    match code {
        codes::UNAUTHORIZED => ClientError::PermissionDenied(message),
        codes::VALIDATION_ERROR => ClientError::Validation(message),
        _ => ClientError::Failed(message),
    }
}

/// Remap a failed write to the message shown for that action. Permission
/// failures keep their distinct variant; everything else becomes the generic
/// try-again message.
fn write_error(err: ClientError, action: &str) -> ClientError {
    match err {
        ClientError::PermissionDenied(_) => {
            ClientError::PermissionDenied(format!("You do not have permission to {}.", action))
        }
        ClientError::Validation(message) => ClientError::Validation(message),
        ClientError::Unavailable => ClientError::Unavailable,
        ClientError::Failed(_) => {
            ClientError::Failed(format!("Failed to {}. Please try again.", action))
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value)
        .map_err(|e| ClientError::Failed(format!("Unexpected response shape: {}", e)))
}

fn or_placeholder(url: &str) -> String {
    if url.trim().is_empty() {
        "#".to_string()
    } else {
        url.to_string()
    }
}

/// Parse the `{success, data}` envelope.
async fn unwrap_envelope(response: reqwest::Response) -> Result<Value, ClientError> {
    let body: Value = response
        .json()
        .await
        .map_err(|e| ClientError::Failed(format!("Malformed response: {}", e)))?;

    if body.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    } else {
        let code = body
            .pointer("/error/code")
            .and_then(Value::as_str)
            .unwrap_or(codes::INTERNAL_ERROR);
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("Request failed")
            .to_string();
        Err(classify(code, message))
    }
}

/// Established connection to the service.
#[derive(Clone)]
struct Transport {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    principal: Option<String>,
}

impl Transport {
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        if let Some(principal) = &self.principal {
            builder = builder.header(PRINCIPAL_HEADER, principal);
        }
        builder
    }

    async fn get(&self, path: &str) -> Result<Value, ClientError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| ClientError::Failed(format!("Request failed: {}", e)))?;
        unwrap_envelope(response).await
    }

    /// GET where a missing resource is a `null` result, not a failure.
    async fn get_optional(&self, path: &str) -> Result<Value, ClientError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| ClientError::Failed(format!("Request failed: {}", e)))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Value::Null);
        }
        unwrap_envelope(response).await
    }

    async fn send_json(&self, method: Method, path: &str, body: &Value) -> Result<Value, ClientError> {
        let response = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Failed(format!("Request failed: {}", e)))?;
        unwrap_envelope(response).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(|e| ClientError::Failed(format!("Request failed: {}", e)))?;
        unwrap_envelope(response).await
    }
}

/// Consumer-side handle to the content service.
pub struct ExamPrepClient {
    transport: Option<Transport>,
    cache: QueryCache,
}

impl ExamPrepClient {
    /// Client bound to a running service.
    pub fn connect(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport: Some(Transport {
                http: reqwest::Client::new(),
                base_url,
                api_key: None,
                principal: None,
            }),
            cache: QueryCache::new(),
        }
    }

    /// Client with no established connection: every read resolves empty
    /// without touching the network, every write fails fast.
    pub fn detached() -> Self {
        Self {
            transport: None,
            cache: QueryCache::new(),
        }
    }

    /// Attach the deployment pre-shared key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        if let Some(transport) = &mut self.transport {
            transport.api_key = Some(key.into());
        }
        self
    }

    /// Attach the signed-in caller's principal.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        if let Some(transport) = &mut self.transport {
            transport.principal = Some(principal.into());
        }
        self
    }

    /// The underlying query cache, observable for loading/error states.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Parse a `YYYY-MM-DD` form value, rejecting malformed input before any
    /// remote call is made.
    pub fn day_key_from_input(value: &str) -> Result<DayKey, ClientError> {
        daykey::date_string_to_day_key(value)
            .map_err(|_| ClientError::Validation("Please enter a valid date".to_string()))
    }

    fn require_transport(&self) -> Result<&Transport, ClientError> {
        self.transport.as_ref().ok_or(ClientError::Unavailable)
    }

    /// Cached read returning `empty` while detached.
    async fn read<T>(
        &self,
        key: QueryKey,
        retries: u32,
        path: String,
        empty: T,
        optional: bool,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let Some(transport) = &self.transport else {
            return Ok(empty);
        };

        let transport = transport.clone();
        let value = self
            .cache
            .fetch(key, retries, move || {
                let transport = transport.clone();
                let path = path.clone();
                async move {
                    if optional {
                        transport.get_optional(&path).await
                    } else {
                        transport.get(&path).await
                    }
                }
            })
            .await?;

        decode(value)
    }

    // ==================== STUDY MATERIAL READS ====================

    pub async fn get_all_study_materials(&self) -> Result<Vec<StudyMaterial>, ClientError> {
        self.read(
            QueryKey::new(["studyMaterials"]),
            READ_RETRIES,
            "/api/study-materials".to_string(),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_study_material_by_id(
        &self,
        id: i64,
    ) -> Result<Option<StudyMaterial>, ClientError> {
        self.read(
            QueryKey::new(["studyMaterials".to_string(), "id".to_string(), id.to_string()]),
            READ_RETRIES,
            format!("/api/study-materials/{}", id),
            None,
            true,
        )
        .await
    }

    pub async fn get_study_materials_by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<StudyMaterial>, ClientError> {
        self.read(
            QueryKey::new(["studyMaterials", "subject", subject]),
            READ_RETRIES,
            format!("/api/study-materials?subject={}", subject),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_study_materials_by_type(
        &self,
        content_type: ContentType,
    ) -> Result<Vec<StudyMaterial>, ClientError> {
        self.read(
            QueryKey::new(["studyMaterials", "type", content_type.as_str()]),
            READ_RETRIES,
            format!("/api/study-materials?contentType={}", content_type.as_str()),
            Vec::new(),
            false,
        )
        .await
    }

    // ==================== PREVIOUS YEAR PAPER READS ====================

    pub async fn get_all_previous_year_papers(
        &self,
    ) -> Result<Vec<PreviousYearPaper>, ClientError> {
        self.read(
            QueryKey::new(["previousYearPapers"]),
            READ_RETRIES,
            "/api/previous-year-papers".to_string(),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_previous_year_paper_by_id(
        &self,
        id: i64,
    ) -> Result<Option<PreviousYearPaper>, ClientError> {
        self.read(
            QueryKey::new([
                "previousYearPapers".to_string(),
                "id".to_string(),
                id.to_string(),
            ]),
            READ_RETRIES,
            format!("/api/previous-year-papers/{}", id),
            None,
            true,
        )
        .await
    }

    pub async fn get_previous_year_papers_by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<PreviousYearPaper>, ClientError> {
        self.read(
            QueryKey::new(["previousYearPapers", "subject", subject]),
            READ_RETRIES,
            format!("/api/previous-year-papers?subject={}", subject),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_previous_year_papers_by_exam(
        &self,
        exam_name: &str,
    ) -> Result<Vec<PreviousYearPaper>, ClientError> {
        self.read(
            QueryKey::new(["previousYearPapers", "exam", exam_name]),
            READ_RETRIES,
            format!("/api/previous-year-papers?exam={}", exam_name),
            Vec::new(),
            false,
        )
        .await
    }

    // ==================== DAILY CONTENT READS ====================

    pub async fn get_all_daily_test_series(
        &self,
    ) -> Result<Vec<DailyTestSeriesEntry>, ClientError> {
        self.read(
            QueryKey::new(["dailyTestSeries"]),
            READ_RETRIES,
            "/api/daily-test-series".to_string(),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_daily_test_series_by_day(
        &self,
        day: DayKey,
    ) -> Result<Vec<DailyTestSeriesEntry>, ClientError> {
        self.read(
            QueryKey::new(["dailyTestSeries".to_string(), "day".to_string(), day.to_string()]),
            READ_RETRIES,
            format!("/api/daily-test-series?day={}", day),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_daily_test_series_by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<DailyTestSeriesEntry>, ClientError> {
        self.read(
            QueryKey::new(["dailyTestSeries", "subject", subject]),
            READ_RETRIES,
            format!("/api/daily-test-series?subject={}", subject),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_all_daily_pollution_entries(
        &self,
    ) -> Result<Vec<DailyPollutionEntry>, ClientError> {
        self.read(
            QueryKey::new(["dailyPollution"]),
            READ_RETRIES,
            "/api/daily-pollution".to_string(),
            Vec::new(),
            false,
        )
        .await
    }

    pub async fn get_daily_pollution_by_day(
        &self,
        day: DayKey,
    ) -> Result<Vec<DailyPollutionEntry>, ClientError> {
        self.read(
            QueryKey::new(["dailyPollution".to_string(), "day".to_string(), day.to_string()]),
            READ_RETRIES,
            format!("/api/daily-pollution?day={}", day),
            Vec::new(),
            false,
        )
        .await
    }

    // ==================== IDENTITY READS ====================

    pub async fn get_caller_user_profile(&self) -> Result<Option<UserProfile>, ClientError> {
        self.read(
            QueryKey::new(["currentUserProfile"]),
            PROFILE_RETRIES,
            "/api/me/profile".to_string(),
            None,
            false,
        )
        .await
    }

    pub async fn get_caller_user_role(&self) -> Result<UserRole, ClientError> {
        self.read(
            QueryKey::new(["currentUserRole"]),
            PROFILE_RETRIES,
            "/api/me/role".to_string(),
            UserRole::Guest,
            false,
        )
        .await
    }

    pub async fn is_caller_admin(&self) -> Result<bool, ClientError> {
        self.read(
            QueryKey::new(["isAdmin"]),
            PROFILE_RETRIES,
            "/api/me/is-admin".to_string(),
            false,
            false,
        )
        .await
    }

    pub async fn get_user_profile(
        &self,
        principal: &str,
    ) -> Result<Option<UserProfile>, ClientError> {
        self.read(
            QueryKey::new(["userProfile", principal]),
            PROFILE_RETRIES,
            format!("/api/users/{}/profile", principal),
            None,
            false,
        )
        .await
    }

    // ==================== ADMIN MUTATIONS ====================

    /// Add a study material; returns its new id.
    pub async fn add_study_material(
        &self,
        title: &str,
        subject: &str,
        content_type: ContentType,
        url: &str,
    ) -> Result<i64, ClientError> {
        if title.trim().is_empty() || subject.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        let transport = self.require_transport()?;

        let request = CreateStudyMaterialRequest {
            title: title.to_string(),
            subject: subject.to_string(),
            content_type,
            url: or_placeholder(url),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::Failed(format!("Encoding failed: {}", e)))?;

        match transport
            .send_json(Method::POST, "/api/study-materials", &body)
            .await
        {
            Ok(value) => {
                self.cache
                    .invalidate(&QueryKey::new(["studyMaterials"]))
                    .await;
                let material: StudyMaterial = decode(value)?;
                Ok(material.id)
            }
            Err(err) => Err(write_error(err, "add study materials")),
        }
    }

    pub async fn delete_study_material(&self, id: i64) -> Result<(), ClientError> {
        let transport = self.require_transport()?;

        match transport
            .delete(&format!("/api/study-materials/{}", id))
            .await
        {
            Ok(_) => {
                self.cache
                    .invalidate(&QueryKey::new(["studyMaterials"]))
                    .await;
                Ok(())
            }
            Err(err) => Err(write_error(err, "delete study materials")),
        }
    }

    /// Add a previous-year paper; returns its new id.
    pub async fn add_previous_year_paper(
        &self,
        year: i64,
        subject: &str,
        exam_name: &str,
        url: &str,
    ) -> Result<i64, ClientError> {
        if subject.trim().is_empty() || exam_name.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        if !(MIN_PAPER_YEAR..=MAX_PAPER_YEAR).contains(&year) {
            return Err(ClientError::Validation(
                "Please enter a valid year".to_string(),
            ));
        }
        let transport = self.require_transport()?;

        let request = CreatePreviousYearPaperRequest {
            year,
            subject: subject.to_string(),
            exam_name: exam_name.to_string(),
            url: or_placeholder(url),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::Failed(format!("Encoding failed: {}", e)))?;

        match transport
            .send_json(Method::POST, "/api/previous-year-papers", &body)
            .await
        {
            Ok(value) => {
                self.cache
                    .invalidate(&QueryKey::new(["previousYearPapers"]))
                    .await;
                let paper: PreviousYearPaper = decode(value)?;
                Ok(paper.id)
            }
            Err(err) => Err(write_error(err, "add previous year papers")),
        }
    }

    pub async fn delete_previous_year_paper(&self, id: i64) -> Result<(), ClientError> {
        let transport = self.require_transport()?;

        match transport
            .delete(&format!("/api/previous-year-papers/{}", id))
            .await
        {
            Ok(_) => {
                self.cache
                    .invalidate(&QueryKey::new(["previousYearPapers"]))
                    .await;
                Ok(())
            }
            Err(err) => Err(write_error(err, "delete previous year papers")),
        }
    }

    /// Add a pollution bulletin; returns its new id.
    pub async fn add_daily_pollution_entry(
        &self,
        day: DayKey,
        air_quality: &str,
        pollution_source: &str,
        recommendations: &str,
    ) -> Result<i64, ClientError> {
        if air_quality.trim().is_empty()
            || pollution_source.trim().is_empty()
            || recommendations.trim().is_empty()
        {
            return Err(ClientError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        let transport = self.require_transport()?;

        let request = CreateDailyPollutionRequest {
            day,
            air_quality: air_quality.to_string(),
            pollution_source: pollution_source.to_string(),
            recommendations: recommendations.to_string(),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::Failed(format!("Encoding failed: {}", e)))?;

        match transport
            .send_json(Method::POST, "/api/daily-pollution", &body)
            .await
        {
            Ok(value) => {
                self.cache
                    .invalidate(&QueryKey::new(["dailyPollution"]))
                    .await;
                let entry: DailyPollutionEntry = decode(value)?;
                Ok(entry.id)
            }
            Err(err) => Err(write_error(err, "add daily pollution entries")),
        }
    }

    pub async fn delete_daily_pollution_entry(&self, id: i64) -> Result<(), ClientError> {
        let transport = self.require_transport()?;

        match transport
            .delete(&format!("/api/daily-pollution/{}", id))
            .await
        {
            Ok(_) => {
                self.cache
                    .invalidate(&QueryKey::new(["dailyPollution"]))
                    .await;
                Ok(())
            }
            Err(err) => Err(write_error(err, "delete daily pollution entries")),
        }
    }

    /// Save the calling principal's own profile.
    pub async fn save_caller_user_profile(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ClientError> {
        if profile.name.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        let transport = self.require_transport()?;

        let body = serde_json::to_value(profile)
            .map_err(|e| ClientError::Failed(format!("Encoding failed: {}", e)))?;

        match transport
            .send_json(Method::PUT, "/api/me/profile", &body)
            .await
        {
            Ok(_) => {
                self.cache
                    .invalidate(&QueryKey::new(["currentUserProfile"]))
                    .await;
                Ok(())
            }
            Err(err) => Err(write_error(err, "save your profile")),
        }
    }

    /// Assign a role to a principal.
    pub async fn assign_user_role(
        &self,
        principal: &str,
        role: UserRole,
    ) -> Result<(), ClientError> {
        if principal.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        let transport = self.require_transport()?;

        let body = serde_json::json!({ "role": role });

        match transport
            .send_json(
                Method::PUT,
                &format!("/api/users/{}/role", principal),
                &body,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => Err(write_error(err, "assign user roles")),
        }
    }
}
