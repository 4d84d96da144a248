//! Public offer listing.

use tracing::instrument;

use super::{ApiClient, ApiError, Credential, Offer, OffersPayload};

impl ApiClient {
    /// List currently active offers. The endpoint is public.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn active_offers(&self) -> Result<Vec<Offer>, ApiError> {
        let payload: OffersPayload = self.get("/offers/active", Credential::Anonymous).await?;
        Ok(payload.into())
    }
}
