//! Response generation: bounded context in, exactly one classified outcome out.

pub mod classifier;
pub mod orchestrator;
pub mod request;
pub mod retry;
pub mod timeout;

pub use classifier::{classify, is_soft_refusal, ClassificationRule, DEFLECTION_TEXT};
pub use orchestrator::ResponseOrchestrator;
pub use request::{
    CustomerMessage, GenerationOutcome, GenerationRequest, RequestError, MAX_MESSAGE_CHARS,
};
pub use retry::{AttemptState, FailureDecision, RetryPolicy};
pub use timeout::{with_timeout, REQUEST_DEADLINE};
