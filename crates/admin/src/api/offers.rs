//! Offer management endpoints.

use serde::Deserialize;
use shopfront_client::api::{ApiError, Credential, Offer, OffersPayload};
use shopfront_core::OfferId;
use tracing::instrument;

use super::{AdminApi, OfferDraft};

/// Single offer payload: `{ "offer": {...} }` or the bare document.
#[derive(Deserialize)]
#[serde(untagged)]
enum OfferPayload {
    Wrapped { offer: Offer },
    Bare(Offer),
}

impl From<OfferPayload> for Offer {
    fn from(payload: OfferPayload) -> Self {
        match payload {
            OfferPayload::Wrapped { offer } | OfferPayload::Bare(offer) => offer,
        }
    }
}

impl AdminApi {
    /// All offers, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn offers(&self) -> Result<Vec<Offer>, ApiError> {
        let payload: OffersPayload = self.client.get("/admin/offers", Credential::Admin).await?;
        Ok(payload.into())
    }

    /// Create an offer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the draft or the request fails.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_offer(&self, draft: &OfferDraft) -> Result<Offer, ApiError> {
        let payload: OfferPayload = self
            .client
            .post("/admin/offers", draft, Credential::Admin)
            .await?;
        Ok(payload.into())
    }

    /// Replace an offer.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer does not exist or the request fails.
    #[instrument(skip(self, draft), fields(offer_id = %id))]
    pub async fn update_offer(&self, id: &OfferId, draft: &OfferDraft) -> Result<Offer, ApiError> {
        let payload: OfferPayload = self
            .client
            .put(&format!("/admin/offers/{id}"), draft, Credential::Admin)
            .await?;
        Ok(payload.into())
    }

    /// Delete an offer.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer does not exist or the request fails.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn delete_offer(&self, id: &OfferId) -> Result<(), ApiError> {
        let _: serde::de::IgnoredAny = self
            .client
            .delete(&format!("/admin/offers/{id}"), Credential::Admin)
            .await?;
        Ok(())
    }

    /// Flip an offer between active and inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer does not exist or the request fails.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn toggle_offer(&self, id: &OfferId) -> Result<Offer, ApiError> {
        let payload: OfferPayload = self
            .client
            .patch(&format!("/admin/offers/{id}/toggle"), Credential::Admin)
            .await?;
        Ok(payload.into())
    }
}
