use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeacherOption {
    pub id: String,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GradeOption {
    pub id: i64,
    pub level: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SubjectOption {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClassOption {
    pub id: i64,
    pub name: String,
}

/// Full class row plus its roster size, used by the student form to show capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClassWithCount {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
    pub supervisor_id: Option<String>,
    pub grade_id: Option<i64>,
    pub student_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LessonOption {
    pub id: i64,
    pub name: String,
    pub class_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentOption {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub class_id: i64,
}

/// An exam or assignment annotated with the class of the lesson it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentOption {
    pub id: i64,
    pub title: String,
    pub class_id: i64,
}
