pub mod calendar;
pub mod lookup;
pub mod principal;
pub mod result;

pub use calendar::{Announcement, Event, LessonSlot};
pub use lookup::{
    AssessmentOption, ClassOption, ClassWithCount, GradeOption, LessonOption, StudentOption,
    SubjectOption, TeacherOption,
};
pub use principal::{Principal, Role};
pub use result::{ActionState, Assessment, RawScore, ResultInput, ResultPayload, ResultRecord};
