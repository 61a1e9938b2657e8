pub mod analysis;
pub mod decision;
pub mod queue;

pub use analysis::{
    AnalysisResponse, AnalysisStatus, Question, QuestionDecision, QuestionId, QuestionRange, Sheet,
    SplitManagerResponse,
};
pub use decision::{DecisionEntry, DecisionMap, SheetFilter, SplitChoice, SubmissionPayload};
pub use queue::{QueuePosition, QueuedFile};
