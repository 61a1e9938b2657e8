pub mod file_ctx;
pub mod submission;

pub use file_ctx::FileCtx;
pub use submission::{PendingConfirmation, PreparedSubmission, SubmissionCoordinator, SubmissionPlan};
