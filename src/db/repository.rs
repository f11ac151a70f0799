use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::{
    Announcement, AssessmentOption, ClassOption, ClassWithCount, Event, GradeOption, LessonOption,
    LessonSlot, ResultPayload, ResultRecord, StudentOption, SubjectOption, TeacherOption,
};

pub async fn fetch_teacher_options(db: &SqlitePool) -> Result<Vec<TeacherOption>, sqlx::Error> {
    sqlx::query_as::<_, TeacherOption>("SELECT id, name, surname FROM teachers ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn fetch_grade_options(db: &SqlitePool) -> Result<Vec<GradeOption>, sqlx::Error> {
    sqlx::query_as::<_, GradeOption>("SELECT id, level FROM grades ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn fetch_subject_options(db: &SqlitePool) -> Result<Vec<SubjectOption>, sqlx::Error> {
    sqlx::query_as::<_, SubjectOption>("SELECT id, name FROM subjects ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn fetch_class_options(db: &SqlitePool) -> Result<Vec<ClassOption>, sqlx::Error> {
    sqlx::query_as::<_, ClassOption>("SELECT id, name FROM classes ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn fetch_classes_with_counts(
    db: &SqlitePool,
) -> Result<Vec<ClassWithCount>, sqlx::Error> {
    // Correlated subquery so a class with no students still reports zero.
    sqlx::query_as::<_, ClassWithCount>(
        r#"
        SELECT
            c.id,
            c.name,
            c.capacity,
            c.supervisor_id,
            c.grade_id,
            (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count
        FROM classes c
        ORDER BY c.id
        "#,
    )
    .fetch_all(db)
    .await
}

/// `teacher_id = None` returns every lesson.
pub async fn fetch_lesson_options(
    db: &SqlitePool,
    teacher_id: Option<&str>,
) -> Result<Vec<LessonOption>, sqlx::Error> {
    sqlx::query_as::<_, LessonOption>(
        r#"
        SELECT id, name, class_id
        FROM lessons
        WHERE (?1 IS NULL OR teacher_id = ?1)
        ORDER BY id
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_student_options(db: &SqlitePool) -> Result<Vec<StudentOption>, sqlx::Error> {
    sqlx::query_as::<_, StudentOption>(
        "SELECT id, name, surname, class_id FROM students ORDER BY surname, name, id",
    )
    .fetch_all(db)
    .await
}

pub async fn fetch_exam_options(
    db: &SqlitePool,
    teacher_id: Option<&str>,
) -> Result<Vec<AssessmentOption>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentOption>(
        r#"
        SELECT e.id, e.title, l.class_id
        FROM exams e
        JOIN lessons l ON l.id = e.lesson_id
        WHERE (?1 IS NULL OR l.teacher_id = ?1)
        ORDER BY e.id
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_assignment_options(
    db: &SqlitePool,
    teacher_id: Option<&str>,
) -> Result<Vec<AssessmentOption>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentOption>(
        r#"
        SELECT a.id, a.title, l.class_id
        FROM assignments a
        JOIN lessons l ON l.id = a.lesson_id
        WHERE (?1 IS NULL OR l.teacher_id = ?1)
        ORDER BY a.id
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db)
    .await
}

pub async fn find_result_by_id(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<ResultRecord>, sqlx::Error> {
    sqlx::query_as::<_, ResultRecord>(
        "SELECT id, score, exam_id, assignment_id, student_id FROM results WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_result(db: &SqlitePool, payload: &ResultPayload) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO results (score, exam_id, assignment_id, student_id)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(payload.score)
    .bind(payload.assessment.exam_id())
    .bind(payload.assessment.assignment_id())
    .bind(&payload.student_id)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_result(
    db: &SqlitePool,
    id: i64,
    payload: &ResultPayload,
) -> Result<bool, sqlx::Error> {
    let affected = sqlx::query(
        r#"
        UPDATE results
        SET score = ?1,
            exam_id = ?2,
            assignment_id = ?3,
            student_id = ?4
        WHERE id = ?5
        "#,
    )
    .bind(payload.score)
    .bind(payload.assessment.exam_id())
    .bind(payload.assessment.assignment_id())
    .bind(&payload.student_id)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

pub async fn find_class_by_student_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<ClassOption>, sqlx::Error> {
    sqlx::query_as::<_, ClassOption>(
        r#"
        SELECT c.id, c.name
        FROM classes c
        WHERE EXISTS (SELECT 1 FROM students s WHERE s.class_id = c.id AND s.email = ?1)
        ORDER BY c.id
        LIMIT 1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn fetch_class_lessons(
    db: &SqlitePool,
    class_id: i64,
) -> Result<Vec<LessonSlot>, sqlx::Error> {
    sqlx::query_as::<_, LessonSlot>(
        "SELECT id, name, start_time, end_time FROM lessons WHERE class_id = ? ORDER BY start_time",
    )
    .bind(class_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_teacher_lessons(
    db: &SqlitePool,
    teacher_id: &str,
) -> Result<Vec<LessonSlot>, sqlx::Error> {
    sqlx::query_as::<_, LessonSlot>(
        "SELECT id, name, start_time, end_time FROM lessons WHERE teacher_id = ? ORDER BY start_time",
    )
    .bind(teacher_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_events_on(db: &SqlitePool, date: NaiveDate) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT id, title, description, start_time, end_time, class_id
        FROM events
        WHERE date(start_time) = ?1
        ORDER BY start_time
        "#,
    )
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_all(db)
    .await
}

/// Latest announcements visible to `class_id`; global ones (no class) are always included.
pub async fn fetch_latest_announcements(
    db: &SqlitePool,
    class_id: Option<i64>,
    limit: i64,
) -> Result<Vec<Announcement>, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(
        r#"
        SELECT id, title, description, date, class_id
        FROM announcements
        WHERE class_id IS NULL OR class_id = ?1
        ORDER BY date DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(class_id)
    .bind(limit)
    .fetch_all(db)
    .await
}
