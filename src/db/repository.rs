//! Database repository for CRUD operations.
//!
//! One method per backend operation. List order is insertion order (`id`),
//! which is the order consumers are promised.

use sqlx::{Row, SqlitePool};

use crate::daykey::DayKey;
use crate::errors::AppError;
use crate::models::{
    ContentType, CreateDailyPollutionRequest, CreatePreviousYearPaperRequest,
    CreateStudyMaterialRequest, DailyPollutionEntry, DailyTestSeriesEntry, PreviousYearPaper,
    StudyMaterial, UserProfile, UserRole,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== STUDY MATERIAL OPERATIONS ====================

    /// List all study materials in insertion order.
    pub async fn list_study_materials(&self) -> Result<Vec<StudyMaterial>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, subject, content_type, url FROM study_materials ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(material_from_row).collect()
    }

    /// Get a study material by ID.
    pub async fn get_study_material(&self, id: i64) -> Result<Option<StudyMaterial>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, subject, content_type, url FROM study_materials WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(material_from_row).transpose()
    }

    /// List study materials with an exact subject-key match.
    pub async fn study_materials_by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<StudyMaterial>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, subject, content_type, url FROM study_materials WHERE subject = ? ORDER BY id",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(material_from_row).collect()
    }

    /// List study materials of a given content type.
    pub async fn study_materials_by_type(
        &self,
        content_type: ContentType,
    ) -> Result<Vec<StudyMaterial>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, subject, content_type, url FROM study_materials WHERE content_type = ? ORDER BY id",
        )
        .bind(content_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(material_from_row).collect()
    }

    /// Add a study material and return the stored record.
    pub async fn add_study_material(
        &self,
        request: &CreateStudyMaterialRequest,
    ) -> Result<StudyMaterial, AppError> {
        let result = sqlx::query(
            "INSERT INTO study_materials (title, subject, content_type, url) VALUES (?, ?, ?, ?)",
        )
        .bind(&request.title)
        .bind(&request.subject)
        .bind(request.content_type.as_str())
        .bind(&request.url)
        .execute(&self.pool)
        .await?;

        Ok(StudyMaterial {
            id: result.last_insert_rowid(),
            title: request.title.clone(),
            subject: request.subject.clone(),
            content_type: request.content_type,
            url: request.url.clone(),
        })
    }

    /// Delete a study material.
    pub async fn delete_study_material(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM study_materials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Study material {} not found", id)));
        }

        Ok(())
    }

    // ==================== PREVIOUS YEAR PAPER OPERATIONS ====================

    /// List all previous-year papers in insertion order.
    pub async fn list_previous_year_papers(&self) -> Result<Vec<PreviousYearPaper>, AppError> {
        let rows = sqlx::query(
            "SELECT id, year, subject, exam_name, url FROM previous_year_papers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(paper_from_row).collect())
    }

    /// Get a previous-year paper by ID.
    pub async fn get_previous_year_paper(
        &self,
        id: i64,
    ) -> Result<Option<PreviousYearPaper>, AppError> {
        let row = sqlx::query(
            "SELECT id, year, subject, exam_name, url FROM previous_year_papers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(paper_from_row))
    }

    /// List papers with an exact subject match.
    pub async fn previous_year_papers_by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<PreviousYearPaper>, AppError> {
        let rows = sqlx::query(
            "SELECT id, year, subject, exam_name, url FROM previous_year_papers WHERE subject = ? ORDER BY id",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(paper_from_row).collect())
    }

    /// List papers with an exact exam-name match.
    pub async fn previous_year_papers_by_exam(
        &self,
        exam_name: &str,
    ) -> Result<Vec<PreviousYearPaper>, AppError> {
        let rows = sqlx::query(
            "SELECT id, year, subject, exam_name, url FROM previous_year_papers WHERE exam_name = ? ORDER BY id",
        )
        .bind(exam_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(paper_from_row).collect())
    }

    /// Add a previous-year paper and return the stored record.
    pub async fn add_previous_year_paper(
        &self,
        request: &CreatePreviousYearPaperRequest,
    ) -> Result<PreviousYearPaper, AppError> {
        let result = sqlx::query(
            "INSERT INTO previous_year_papers (year, subject, exam_name, url) VALUES (?, ?, ?, ?)",
        )
        .bind(request.year)
        .bind(&request.subject)
        .bind(&request.exam_name)
        .bind(&request.url)
        .execute(&self.pool)
        .await?;

        Ok(PreviousYearPaper {
            id: result.last_insert_rowid(),
            year: request.year,
            subject: request.subject.clone(),
            exam_name: request.exam_name.clone(),
            url: request.url.clone(),
        })
    }

    /// Delete a previous-year paper.
    pub async fn delete_previous_year_paper(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM previous_year_papers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Previous year paper {} not found",
                id
            )));
        }

        Ok(())
    }

    // ==================== DAILY TEST SERIES OPERATIONS ====================

    /// List all daily test series entries in insertion order.
    pub async fn list_daily_test_series(&self) -> Result<Vec<DailyTestSeriesEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, day, subject, test_name, description, questions_url, video_lecture_url, answers_url FROM daily_test_series ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(test_series_from_row).collect())
    }

    /// List test series entries published for a given day.
    pub async fn daily_test_series_by_day(
        &self,
        day: DayKey,
    ) -> Result<Vec<DailyTestSeriesEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, day, subject, test_name, description, questions_url, video_lecture_url, answers_url FROM daily_test_series WHERE day = ? ORDER BY id",
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(test_series_from_row).collect())
    }

    /// List test series entries with an exact subject-key match.
    pub async fn daily_test_series_by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<DailyTestSeriesEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, day, subject, test_name, description, questions_url, video_lecture_url, answers_url FROM daily_test_series WHERE subject = ? ORDER BY id",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(test_series_from_row).collect())
    }

    // ==================== DAILY POLLUTION OPERATIONS ====================

    /// List all pollution bulletins in insertion order.
    pub async fn list_daily_pollution_entries(
        &self,
    ) -> Result<Vec<DailyPollutionEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, day, air_quality, pollution_source, recommendations FROM daily_pollution ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(pollution_from_row).collect())
    }

    /// List pollution bulletins published for a given day.
    pub async fn daily_pollution_by_day(
        &self,
        day: DayKey,
    ) -> Result<Vec<DailyPollutionEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, day, air_quality, pollution_source, recommendations FROM daily_pollution WHERE day = ? ORDER BY id",
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(pollution_from_row).collect())
    }

    /// Add a pollution bulletin and return the stored record.
    pub async fn add_daily_pollution_entry(
        &self,
        request: &CreateDailyPollutionRequest,
    ) -> Result<DailyPollutionEntry, AppError> {
        let result = sqlx::query(
            "INSERT INTO daily_pollution (day, air_quality, pollution_source, recommendations) VALUES (?, ?, ?, ?)",
        )
        .bind(request.day)
        .bind(&request.air_quality)
        .bind(&request.pollution_source)
        .bind(&request.recommendations)
        .execute(&self.pool)
        .await?;

        Ok(DailyPollutionEntry {
            id: result.last_insert_rowid(),
            day: request.day,
            air_quality: request.air_quality.clone(),
            pollution_source: request.pollution_source.clone(),
            recommendations: request.recommendations.clone(),
        })
    }

    /// Delete a pollution bulletin.
    pub async fn delete_daily_pollution_entry(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM daily_pollution WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Daily pollution entry {} not found",
                id
            )));
        }

        Ok(())
    }

    // ==================== IDENTITY OPERATIONS ====================

    /// Get the stored role for a principal, if any.
    pub async fn get_user_role(&self, principal: &str) -> Result<Option<UserRole>, AppError> {
        let row = sqlx::query("SELECT role FROM user_roles WHERE principal = ?")
            .bind(principal)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let raw: String = row.get("role");
            UserRole::from_str(&raw)
                .ok_or_else(|| AppError::Internal(format!("Unknown role in database: {}", raw)))
        })
        .transpose()
    }

    /// Assign a role to a principal, replacing any existing assignment.
    pub async fn assign_user_role(
        &self,
        principal: &str,
        role: UserRole,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_roles (principal, role) VALUES (?, ?) ON CONFLICT(principal) DO UPDATE SET role = excluded.role",
        )
        .bind(principal)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Grant the admin role to a principal unless it already has one.
    ///
    /// Used for startup seeding; an explicit assignment always wins.
    pub async fn seed_admin(&self, principal: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_roles (principal, role) VALUES (?, ?) ON CONFLICT(principal) DO NOTHING",
        )
        .bind(principal)
        .bind(UserRole::Admin.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the profile stored for a principal, if any.
    pub async fn get_user_profile(&self, principal: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query("SELECT name FROM user_profiles WHERE principal = ?")
            .bind(principal)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserProfile {
            name: row.get("name"),
        }))
    }

    /// Save the profile for a principal, replacing any existing one.
    pub async fn save_user_profile(
        &self,
        principal: &str,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_profiles (principal, name) VALUES (?, ?) ON CONFLICT(principal) DO UPDATE SET name = excluded.name",
        )
        .bind(principal)
        .bind(&profile.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// Helper functions for row conversion

fn material_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StudyMaterial, AppError> {
    let raw_type: String = row.get("content_type");
    let content_type = ContentType::from_str(&raw_type).ok_or_else(|| {
        AppError::Internal(format!("Unknown content type in database: {}", raw_type))
    })?;

    Ok(StudyMaterial {
        id: row.get("id"),
        title: row.get("title"),
        subject: row.get("subject"),
        content_type,
        url: row.get("url"),
    })
}

fn paper_from_row(row: &sqlx::sqlite::SqliteRow) -> PreviousYearPaper {
    PreviousYearPaper {
        id: row.get("id"),
        year: row.get("year"),
        subject: row.get("subject"),
        exam_name: row.get("exam_name"),
        url: row.get("url"),
    }
}

fn test_series_from_row(row: &sqlx::sqlite::SqliteRow) -> DailyTestSeriesEntry {
    DailyTestSeriesEntry {
        id: row.get("id"),
        day: row.get("day"),
        subject: row.get("subject"),
        test_name: row.get("test_name"),
        description: row.get("description"),
        questions_url: row.get("questions_url"),
        video_lecture_url: row.get("video_lecture_url"),
        answers_url: row.get("answers_url"),
    }
}

fn pollution_from_row(row: &sqlx::sqlite::SqliteRow) -> DailyPollutionEntry {
    DailyPollutionEntry {
        id: row.get("id"),
        day: row.get("day"),
        air_quality: row.get("air_quality"),
        pollution_source: row.get("pollution_source"),
        recommendations: row.get("recommendations"),
    }
}
