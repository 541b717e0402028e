mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod program;
pub use program::{Program, ProgramCreate};

mod course;
pub use course::{Course, CourseCreate};

mod module;
pub use module::{Module, ModuleCreate, ModuleWithLessonsRow};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonWithStatusRow};

mod assignment;
pub use assignment::{Assignment, AssignmentCreate};

mod cohort;
pub use cohort::{Cohort, CohortCreate};

mod enrollment;
pub use enrollment::{ActiveEnrollmentRow, Enrollment, EnrollmentStatus};

mod submission;
pub use submission::{Submission, SubmissionCreate, SubmissionStatus};

mod feedback;
pub use feedback::{Feedback, FeedbackCreate};

mod call;
pub use call::{Call, CallCreate};

mod scheduled_event;
pub use scheduled_event::{ScheduleStatus, ScheduledEvent, ScheduledEventCreate};

mod progress;
pub use progress::LessonProgress;

mod lesson_access;
pub use lesson_access::LessonAccess;

mod certificate;
pub use certificate::{Certificate, CertificateDetailsRow};
