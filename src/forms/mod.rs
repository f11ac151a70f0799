pub mod result_form;

pub use result_form::{AssessmentType, FormMode, ResultForm, ResultFormOptions, SubmitOutcome};
