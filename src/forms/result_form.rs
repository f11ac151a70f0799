use serde::Serialize;
use tracing::{info, warn};

use crate::models::{
    ActionState, Assessment, AssessmentOption, ClassOption, RawScore, ResultInput, ResultPayload,
    ResultRecord, StudentOption,
};
use crate::services::{RelatedData, ResultActions};
use crate::validation::FieldErrors;

pub const GENERIC_ERROR: &str = "Something went wrong!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update(ResultRecord),
}

/// UI-only toggle deciding which assessment dropdown is shown. Never submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    #[default]
    Unset,
    Exam,
    Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation blocked the submission; the action was not called.
    Invalid(FieldErrors),
    /// The action succeeded; the form closed and a refresh was requested.
    Saved { toast: String },
    /// The action reported failure; the form stays open.
    Failed,
}

/// Option lists and widget state the result form renders right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFormOptions {
    pub classes: Vec<ClassOption>,
    pub students: Vec<StudentOption>,
    pub exams: Vec<AssessmentOption>,
    pub assignments: Vec<AssessmentOption>,
    pub exam_visible: bool,
    pub assignment_visible: bool,
    pub assessment_enabled: bool,
    pub student_enabled: bool,
    pub assessment_placeholder: &'static str,
    pub student_placeholder: &'static str,
}

#[derive(Debug, Clone)]
pub struct ResultForm {
    mode: FormMode,
    classes: Vec<ClassOption>,
    students: Vec<StudentOption>,
    exams: Vec<AssessmentOption>,
    assignments: Vec<AssessmentOption>,

    selected_class: Option<i64>,
    assessment_type: AssessmentType,
    assessment: Option<Assessment>,
    student_id: Option<String>,
    score: Option<String>,

    open: bool,
    refresh_requested: bool,
    action_state: ActionState,
    errors: FieldErrors,
}

impl ResultForm {
    pub fn new(mode: FormMode, related: &RelatedData) -> Self {
        let mut form = Self {
            mode: FormMode::Create,
            classes: related
                .classes
                .as_ref()
                .map(|c| c.options())
                .unwrap_or_default(),
            students: related.students.clone().unwrap_or_default(),
            exams: related.exams.clone().unwrap_or_default(),
            assignments: related.assignments.clone().unwrap_or_default(),
            selected_class: None,
            assessment_type: AssessmentType::Unset,
            assessment: None,
            student_id: None,
            score: None,
            open: true,
            refresh_requested: false,
            action_state: ActionState::default(),
            errors: FieldErrors::default(),
        };

        if let FormMode::Update(existing) = &mode {
            form.prefill(existing);
        }
        form.mode = mode;
        form
    }

    fn prefill(&mut self, existing: &ResultRecord) {
        self.student_id = Some(existing.student_id.clone());
        self.score = Some(existing.score.to_string());
        self.assessment = existing.assessment();

        // The class comes from the prefetched row; a row outside the caller's
        // scope leaves the class unselected.
        match self.assessment {
            Some(Assessment::Exam(id)) => {
                self.assessment_type = AssessmentType::Exam;
                self.selected_class = self.exams.iter().find(|e| e.id == id).map(|e| e.class_id);
            }
            Some(Assessment::Assignment(id)) => {
                self.assessment_type = AssessmentType::Assignment;
                self.selected_class = self
                    .assignments
                    .iter()
                    .find(|a| a.id == id)
                    .map(|a| a.class_id);
            }
            None => {}
        }
    }

    /// Narrows the dependent dropdowns. Earlier picks are left untouched even
    /// if they no longer belong to the new class.
    pub fn select_class(&mut self, class_id: Option<i64>) {
        self.selected_class = class_id;
    }

    pub fn set_assessment_type(&mut self, kind: AssessmentType) {
        if kind == self.assessment_type {
            return;
        }
        self.assessment_type = kind;
        self.assessment = None;
    }

    pub fn choose_exam(&mut self, exam_id: i64) {
        self.set_assessment_type(AssessmentType::Exam);
        self.assessment = Some(Assessment::Exam(exam_id));
    }

    pub fn choose_assignment(&mut self, assignment_id: i64) {
        self.set_assessment_type(AssessmentType::Assignment);
        self.assessment = Some(Assessment::Assignment(assignment_id));
    }

    pub fn choose_student(&mut self, student_id: impl Into<String>) {
        self.student_id = Some(student_id.into());
    }

    pub fn set_score(&mut self, raw: impl Into<String>) {
        self.score = Some(raw.into());
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn selected_class(&self) -> Option<i64> {
        self.selected_class
    }

    pub fn assessment_type(&self) -> AssessmentType {
        self.assessment_type
    }

    pub fn assessment(&self) -> Option<Assessment> {
        self.assessment
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn refresh_requested(&self) -> bool {
        self.refresh_requested
    }

    pub fn action_state(&self) -> ActionState {
        self.action_state
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.action_state.error.then_some(GENERIC_ERROR)
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Create a new result",
            FormMode::Update(_) => "Update the result",
        }
    }

    pub fn options(&self) -> ResultFormOptions {
        let (students, exams, assignments): (
            Vec<StudentOption>,
            Vec<AssessmentOption>,
            Vec<AssessmentOption>,
        ) = match self.selected_class {
            Some(class_id) => (
                self.students
                    .iter()
                    .filter(|s| s.class_id == class_id)
                    .cloned()
                    .collect(),
                self.exams
                    .iter()
                    .filter(|e| e.class_id == class_id)
                    .cloned()
                    .collect(),
                self.assignments
                    .iter()
                    .filter(|a| a.class_id == class_id)
                    .cloned()
                    .collect(),
            ),
            None => (
                self.students.clone(),
                self.exams.clone(),
                self.assignments.clone(),
            ),
        };

        let class_chosen = self.selected_class.is_some();
        let assessment_placeholder = match (class_chosen, self.assessment_type) {
            (false, _) => "Select a class first",
            (true, AssessmentType::Assignment) => "Select an assignment",
            (true, _) => "Select an exam",
        };

        ResultFormOptions {
            classes: self.classes.clone(),
            students,
            exams,
            assignments,
            exam_visible: self.assessment_type == AssessmentType::Exam,
            assignment_visible: self.assessment_type == AssessmentType::Assignment,
            assessment_enabled: class_chosen,
            student_enabled: class_chosen,
            assessment_placeholder,
            student_placeholder: if class_chosen {
                "Select a student"
            } else {
                "Select a class first"
            },
        }
    }

    fn input(&self) -> ResultInput {
        ResultInput {
            id: match &self.mode {
                FormMode::Create => None,
                FormMode::Update(existing) => Some(existing.id),
            },
            student_id: self.student_id.clone(),
            exam_id: self.assessment.and_then(|a| a.exam_id()),
            assignment_id: self.assessment.and_then(|a| a.assignment_id()),
            score: self.score.clone().map(RawScore::Text),
        }
    }

    pub fn validate(&self) -> Result<ResultPayload, FieldErrors> {
        self.input()
            .validate(matches!(self.mode, FormMode::Update(_)))
    }

    /// Validates, then calls exactly one create or update action.
    pub async fn submit(&mut self, actions: &dyn ResultActions) -> SubmitOutcome {
        let payload = match self.validate() {
            Ok(payload) => payload,
            Err(errors) => {
                self.errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
        };
        self.errors = FieldErrors::default();

        let (state, verb) = match self.mode {
            FormMode::Create => (actions.create(payload).await, "created"),
            FormMode::Update(_) => (actions.update(payload).await, "updated"),
        };
        self.action_state = state;

        if state.success {
            info!("result form submitted ({})", verb);
            self.open = false;
            self.refresh_requested = true;
            SubmitOutcome::Saved {
                toast: format!("Result has been {}!", verb),
            }
        } else {
            warn!("result form submission failed");
            SubmitOutcome::Failed
        }
    }
}
