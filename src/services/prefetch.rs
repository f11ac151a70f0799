use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    AssessmentOption, ClassOption, ClassWithCount, GradeOption, LessonOption, Principal,
    StudentOption, SubjectOption, TeacherOption,
};

/// Entity a dashboard form edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Teacher,
    Student,
    Parent,
    Subject,
    Class,
    Lesson,
    Exam,
    Assignment,
    Result,
    Attendance,
    Event,
    Announcement,
}

impl Table {
    pub const ALL: [Table; 12] = [
        Table::Teacher,
        Table::Student,
        Table::Parent,
        Table::Subject,
        Table::Class,
        Table::Lesson,
        Table::Exam,
        Table::Assignment,
        Table::Result,
        Table::Attendance,
        Table::Event,
        Table::Announcement,
    ];
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Teacher => "teacher",
            Table::Student => "student",
            Table::Parent => "parent",
            Table::Subject => "subject",
            Table::Class => "class",
            Table::Lesson => "lesson",
            Table::Exam => "exam",
            Table::Assignment => "assignment",
            Table::Result => "result",
            Table::Attendance => "attendance",
            Table::Event => "event",
            Table::Announcement => "announcement",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

/// Which lessons (and the exams/assignments hanging off them) a caller may pick from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonScope {
    All,
    TaughtBy(String),
}

impl LessonScope {
    /// Teachers only see their own lessons; every other role sees all of them.
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_teacher() {
            LessonScope::TaughtBy(principal.id.clone())
        } else {
            LessonScope::All
        }
    }

    pub fn teacher_id(&self) -> Option<&str> {
        match self {
            LessonScope::All => None,
            LessonScope::TaughtBy(id) => Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassList {
    WithCounts(Vec<ClassWithCount>),
    Plain(Vec<ClassOption>),
}

impl ClassList {
    pub fn options(&self) -> Vec<ClassOption> {
        match self {
            ClassList::Plain(classes) => classes.clone(),
            ClassList::WithCounts(classes) => classes
                .iter()
                .map(|c| ClassOption {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect(),
        }
    }
}

/// Dropdown lookup rows for one form, keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teachers: Option<Vec<TeacherOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grades: Option<Vec<GradeOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<SubjectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<ClassList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lessons: Option<Vec<LessonOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<StudentOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exams: Option<Vec<AssessmentOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<AssessmentOption>>,
}

impl RelatedData {
    pub fn is_empty(&self) -> bool {
        self.relation_names().is_empty()
    }

    pub fn relation_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.teachers.is_some() {
            names.push("teachers");
        }
        if self.grades.is_some() {
            names.push("grades");
        }
        if self.subjects.is_some() {
            names.push("subjects");
        }
        if self.classes.is_some() {
            names.push("classes");
        }
        if self.lessons.is_some() {
            names.push("lessons");
        }
        if self.students.is_some() {
            names.push("students");
        }
        if self.exams.is_some() {
            names.push("exams");
        }
        if self.assignments.is_some() {
            names.push("assignments");
        }
        names
    }
}

/// Read-only lookups backing form dropdowns.
#[async_trait]
pub trait RelatedLookups: Send + Sync {
    async fn teachers(&self) -> Result<Vec<TeacherOption>, AppError>;
    async fn grades(&self) -> Result<Vec<GradeOption>, AppError>;
    async fn subjects(&self) -> Result<Vec<SubjectOption>, AppError>;
    async fn classes(&self) -> Result<Vec<ClassOption>, AppError>;
    async fn classes_with_counts(&self) -> Result<Vec<ClassWithCount>, AppError>;
    async fn lessons(&self, scope: &LessonScope) -> Result<Vec<LessonOption>, AppError>;
    async fn students(&self) -> Result<Vec<StudentOption>, AppError>;
    async fn exams(&self, scope: &LessonScope) -> Result<Vec<AssessmentOption>, AppError>;
    async fn assignments(&self, scope: &LessonScope) -> Result<Vec<AssessmentOption>, AppError>;
}

pub struct SqliteLookups {
    db: SqlitePool,
}

impl SqliteLookups {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RelatedLookups for SqliteLookups {
    async fn teachers(&self) -> Result<Vec<TeacherOption>, AppError> {
        Ok(repository::fetch_teacher_options(&self.db).await?)
    }

    async fn grades(&self) -> Result<Vec<GradeOption>, AppError> {
        Ok(repository::fetch_grade_options(&self.db).await?)
    }

    async fn subjects(&self) -> Result<Vec<SubjectOption>, AppError> {
        Ok(repository::fetch_subject_options(&self.db).await?)
    }

    async fn classes(&self) -> Result<Vec<ClassOption>, AppError> {
        Ok(repository::fetch_class_options(&self.db).await?)
    }

    async fn classes_with_counts(&self) -> Result<Vec<ClassWithCount>, AppError> {
        Ok(repository::fetch_classes_with_counts(&self.db).await?)
    }

    async fn lessons(&self, scope: &LessonScope) -> Result<Vec<LessonOption>, AppError> {
        Ok(repository::fetch_lesson_options(&self.db, scope.teacher_id()).await?)
    }

    async fn students(&self) -> Result<Vec<StudentOption>, AppError> {
        Ok(repository::fetch_student_options(&self.db).await?)
    }

    async fn exams(&self, scope: &LessonScope) -> Result<Vec<AssessmentOption>, AppError> {
        Ok(repository::fetch_exam_options(&self.db, scope.teacher_id()).await?)
    }

    async fn assignments(&self, scope: &LessonScope) -> Result<Vec<AssessmentOption>, AppError> {
        Ok(repository::fetch_assignment_options(&self.db, scope.teacher_id()).await?)
    }
}

/// Loads the lookup rows a `table` form needs for `action`.
///
/// Deletes need nothing, so no query is issued for them. Lookups for one
/// table run concurrently; the first failure is returned as-is.
pub async fn prefetch(
    lookups: &dyn RelatedLookups,
    table: Table,
    action: ActionType,
    scope: &LessonScope,
) -> Result<RelatedData, AppError> {
    if action == ActionType::Delete {
        debug!("prefetch skipped for {} delete", table);
        return Ok(RelatedData::default());
    }

    let related = match table {
        Table::Subject => RelatedData {
            teachers: Some(lookups.teachers().await?),
            ..Default::default()
        },
        Table::Class => {
            let (teachers, grades) = tokio::try_join!(lookups.teachers(), lookups.grades())?;
            RelatedData {
                teachers: Some(teachers),
                grades: Some(grades),
                ..Default::default()
            }
        }
        Table::Teacher => RelatedData {
            subjects: Some(lookups.subjects().await?),
            ..Default::default()
        },
        Table::Student => {
            let (grades, classes) =
                tokio::try_join!(lookups.grades(), lookups.classes_with_counts())?;
            RelatedData {
                grades: Some(grades),
                classes: Some(ClassList::WithCounts(classes)),
                ..Default::default()
            }
        }
        Table::Exam | Table::Assignment => {
            let (classes, lessons) = tokio::try_join!(lookups.classes(), lookups.lessons(scope))?;
            RelatedData {
                classes: Some(ClassList::Plain(classes)),
                lessons: Some(lessons),
                ..Default::default()
            }
        }
        Table::Lesson => {
            let (subjects, classes, teachers) =
                tokio::try_join!(lookups.subjects(), lookups.classes(), lookups.teachers())?;
            RelatedData {
                subjects: Some(subjects),
                classes: Some(ClassList::Plain(classes)),
                teachers: Some(teachers),
                ..Default::default()
            }
        }
        Table::Announcement | Table::Event => RelatedData {
            classes: Some(ClassList::Plain(lookups.classes().await?)),
            ..Default::default()
        },
        Table::Result => {
            let (classes, students, exams, assignments) = tokio::try_join!(
                lookups.classes(),
                lookups.students(),
                lookups.exams(scope),
                lookups.assignments(scope),
            )?;
            RelatedData {
                classes: Some(ClassList::Plain(classes)),
                students: Some(students),
                exams: Some(exams),
                assignments: Some(assignments),
                ..Default::default()
            }
        }
        Table::Parent | Table::Attendance => RelatedData::default(),
    };

    info!(
        "prefetched {:?} for {} form (scope: {:?})",
        related.relation_names(),
        table,
        scope
    );
    Ok(related)
}
