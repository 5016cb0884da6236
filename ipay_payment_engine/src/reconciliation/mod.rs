//! The reconciliation engine: the state machine that turns verified gateway callbacks into
//! payment and order transitions. All invariants about idempotency and exactly-one-completion
//! are enforced here and in the backend's transactional methods; the HTTP layer above this only
//! translates results into responses.

mod api;
mod objects;

pub use api::{ReconciliationApi, ReconciliationError};
pub use objects::{FailureReason, ReconciliationConfig, ReconciliationResult, StatusPollResult};
