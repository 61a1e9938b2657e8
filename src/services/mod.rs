pub mod auto_resolver;
pub mod decision_store;
pub mod notifier;
pub mod status_poller;

pub use auto_resolver::{AutoDecision, AutoResolver, Resolution, ResolutionSummary};
pub use decision_store::DecisionStore;
pub use notifier::{Notice, NoticeLevel, NoticeWriter, Notifier};
pub use status_poller::{classify_poll_error, PollErrorKind, PollSnapshot, StatusPoller};
