// ── Ticket validation seam ──

use async_trait::async_trait;
use serde::Serialize;

use univent_api::ApiClient;

use crate::error::CoreError;

/// The backend's decision on one ticket code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketVerdict {
    pub valid: bool,
    pub message: String,
    pub subject_name: Option<String>,
}

impl From<univent_api::ValidateTicketResponse> for TicketVerdict {
    fn from(resp: univent_api::ValidateTicketResponse) -> Self {
        Self {
            valid: resp.valid,
            message: resp.message,
            subject_name: resp.subject_name,
        }
    }
}

/// Something that can rule on a ticket code for an event.
///
/// `Ok` means the backend answered, whichever way it ruled. `Err` is
/// reserved for transport or unexpected failures.
#[async_trait]
pub trait TicketValidator: Send + Sync {
    async fn validate(&self, code: &str, event_id: &str) -> Result<TicketVerdict, CoreError>;
}

#[async_trait]
impl TicketValidator for ApiClient {
    async fn validate(&self, code: &str, event_id: &str) -> Result<TicketVerdict, CoreError> {
        Ok(self.validate_ticket(code, event_id).await?.into())
    }
}
