// Ticket validation
//
// The backend is the single source of truth for ticket acceptance. A
// business rejection ("already used", "wrong event") may arrive either as
// a 200 with `valid: false` or as a 4xx carrying a message; both are
// returned as a negative verdict rather than an error.

use reqwest::StatusCode;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ValidateTicketRequest, ValidateTicketResponse};

/// Statuses the backend uses for business-level ticket rejections.
const REJECTION_STATUSES: [StatusCode; 4] = [
    StatusCode::BAD_REQUEST,
    StatusCode::CONFLICT,
    StatusCode::GONE,
    StatusCode::UNPROCESSABLE_ENTITY,
];

impl ApiClient {
    /// Validate (and consume) a ticket code for an event.
    pub async fn validate_ticket(
        &self,
        code: &str,
        event_id: &str,
    ) -> Result<ValidateTicketResponse, Error> {
        let url = self.api_url("tickets/validate")?;
        debug!(event_id, "validating ticket");

        let body = ValidateTicketRequest { code, event_id };
        match self.post::<ValidateTicketResponse>(url, &body).await {
            Ok(verdict) => Ok(verdict),
            Err(Error::Api { status, message }) if is_rejection(status) => {
                debug!(status, "ticket rejected by backend");
                Ok(ValidateTicketResponse {
                    valid: false,
                    message,
                    subject_name: None,
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn is_rejection(status: u16) -> bool {
    REJECTION_STATUSES.iter().any(|s| s.as_u16() == status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_a_rejection() {
        assert!(is_rejection(409));
        assert!(!is_rejection(500));
        assert!(!is_rejection(401));
    }
}
