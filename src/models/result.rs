use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::FieldErrors;

/// The single assessment a result is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assessment {
    #[serde(rename = "examId")]
    Exam(i64),
    #[serde(rename = "assignmentId")]
    Assignment(i64),
}

impl Assessment {
    pub fn exam_id(&self) -> Option<i64> {
        match self {
            Assessment::Exam(id) => Some(*id),
            Assessment::Assignment(_) => None,
        }
    }

    pub fn assignment_id(&self) -> Option<i64> {
        match self {
            Assessment::Assignment(id) => Some(*id),
            Assessment::Exam(_) => None,
        }
    }
}

/// Validated create/update payload handed to a server action.
///
/// Serializes flat, e.g. `{"studentId":"s1","examId":10,"score":95}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_id: String,
    #[serde(flatten)]
    pub assessment: Assessment,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawScore {
    Int(i64),
    Float(f64),
    Text(String),
}

const I64_LOW: f64 = i64::MIN as f64;
// 2^63, one past i64::MAX.
const I64_HIGH: f64 = i64::MAX as f64;

/// Unvalidated result input as it arrives from a form or a request body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub exam_id: Option<i64>,
    #[serde(default)]
    pub assignment_id: Option<i64>,
    #[serde(default)]
    pub score: Option<RawScore>,
}

impl ResultInput {
    pub fn validate(&self, require_id: bool) -> Result<ResultPayload, FieldErrors> {
        let mut errors = FieldErrors::default();

        let score = match &self.score {
            None => {
                errors.add("score", "Score is required!");
                None
            }
            Some(RawScore::Int(v)) => Some(*v),
            // `as` saturates, so anything outside i64 must be caught first.
            Some(RawScore::Float(v)) if !v.is_finite() || *v < I64_LOW || *v >= I64_HIGH => {
                errors.add("score", "Score must be a number!");
                None
            }
            Some(RawScore::Float(v)) if v.fract() == 0.0 => Some(*v as i64),
            Some(RawScore::Float(_)) => {
                errors.add("score", "Score must be a whole number!");
                None
            }
            Some(RawScore::Text(raw)) if raw.trim().is_empty() => {
                errors.add("score", "Score is required!");
                None
            }
            Some(RawScore::Text(raw)) => match raw.trim().parse::<i64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    errors.add("score", "Score must be a number!");
                    None
                }
            },
        };

        let student_id = match self.student_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => {
                errors.add("studentId", "Student is required!");
                None
            }
        };

        let assessment = match (self.exam_id, self.assignment_id) {
            (Some(exam), None) => Some(Assessment::Exam(exam)),
            (None, Some(assignment)) => Some(Assessment::Assignment(assignment)),
            (None, None) => {
                errors.add("examId", "Exam or assignment is required!");
                None
            }
            (Some(_), Some(_)) => {
                errors.add("examId", "Choose either an exam or an assignment, not both!");
                None
            }
        };

        if require_id && self.id.is_none() {
            errors.add("id", "Id is required!");
        }

        match (student_id, assessment, score) {
            (Some(student_id), Some(assessment), Some(score)) if errors.is_empty() => {
                Ok(ResultPayload {
                    id: self.id,
                    student_id,
                    assessment,
                    score,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: i64,
    pub score: i64,
    pub exam_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub student_id: String,
}

impl ResultRecord {
    pub fn assessment(&self) -> Option<Assessment> {
        match (self.exam_id, self.assignment_id) {
            (Some(exam), _) => Some(Assessment::Exam(exam)),
            (None, Some(assignment)) => Some(Assessment::Assignment(assignment)),
            (None, None) => None,
        }
    }
}

/// Outcome flag pair returned by every server action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    pub success: bool,
    pub error: bool,
}

impl ActionState {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            error: true,
        }
    }
}
