use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::LessonSlot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOwner {
    Class(i64),
    Teacher(String),
}

impl ScheduleOwner {
    /// Parses the `type`/`id` pair used by schedule links (`classId` or `teacherId`).
    pub fn from_params(kind: &str, id: &str) -> Result<Self, AppError> {
        match kind {
            "classId" => id
                .parse::<i64>()
                .map(ScheduleOwner::Class)
                .map_err(|_| AppError::BadRequest(format!("invalid class id: {}", id))),
            "teacherId" if !id.trim().is_empty() => Ok(ScheduleOwner::Teacher(id.to_string())),
            "teacherId" => Err(AppError::BadRequest("teacher id is empty".to_string())),
            other => Err(AppError::BadRequest(format!("unknown schedule type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Moves each lesson onto the same weekday of the Monday-based week containing `reference`.
pub fn adjust_to_week(lessons: &[LessonSlot], reference: NaiveDate) -> Vec<ScheduleEntry> {
    let week_start =
        reference - Duration::days(i64::from(reference.weekday().num_days_from_monday()));

    lessons
        .iter()
        .map(|lesson| {
            let offset = i64::from(lesson.start_time.weekday().num_days_from_monday());
            let day = week_start + Duration::days(offset);
            let start = day.and_time(lesson.start_time.time());
            let end = start + (lesson.end_time - lesson.start_time);
            ScheduleEntry {
                title: lesson.name.clone(),
                start,
                end,
            }
        })
        .collect()
}

pub async fn schedule_for(
    db: &SqlitePool,
    owner: &ScheduleOwner,
    reference: NaiveDate,
) -> Result<Vec<ScheduleEntry>, AppError> {
    let lessons = match owner {
        ScheduleOwner::Class(class_id) => repository::fetch_class_lessons(db, *class_id).await?,
        ScheduleOwner::Teacher(teacher_id) => {
            repository::fetch_teacher_lessons(db, teacher_id).await?
        }
    };
    Ok(adjust_to_week(&lessons, reference))
}
