use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::EventSummary;

impl ApiClient {
    /// Fetch the details of a single event.
    ///
    /// The id is sent as one path segment, so `/`, `?` and `#` in it are
    /// percent-encoded rather than changing the request path.
    pub async fn get_event(&self, event_id: &str) -> Result<EventSummary, Error> {
        let mut url = self.api_url("events")?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(event_id);
        debug!(event_id, "fetching event");
        self.get(url).await
    }
}
