//! Product review endpoints.

use serde::de::IgnoredAny;
use shopfront_core::{ProductId, Rating, ReviewId};
use tracing::instrument;

use super::{
    ApiClient, ApiError, CreateReviewRequest, Credential, PageQuery, ReviewPage,
    UpdateReviewRequest,
};

impl ApiClient {
    /// Fetch one page of a product's reviews with aggregate stats.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_reviews(
        &self,
        product_id: &ProductId,
        page: u32,
        limit: u32,
    ) -> Result<ReviewPage, ApiError> {
        self.get_with_query(
            &format!("/reviews/product/{product_id}"),
            &PageQuery { page, limit },
            Credential::Anonymous,
        )
        .await
    }

    /// Post a review as the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the review or the request fails.
    #[instrument(skip(self, comment), fields(product_id = %product_id))]
    pub async fn create_review(
        &self,
        product_id: &ProductId,
        rating: Rating,
        comment: &str,
    ) -> Result<(), ApiError> {
        let body = CreateReviewRequest {
            product_id,
            rating,
            comment,
        };
        let _: IgnoredAny = self.post("/reviews", &body, Credential::Customer).await?;
        Ok(())
    }

    /// Edit one of the signed-in customer's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the edit or the request fails.
    #[instrument(skip(self, comment), fields(review_id = %review_id))]
    pub async fn update_review(
        &self,
        review_id: &ReviewId,
        rating: Rating,
        comment: &str,
    ) -> Result<(), ApiError> {
        let body = UpdateReviewRequest { rating, comment };
        let _: IgnoredAny = self
            .put(&format!("/reviews/{review_id}"), &body, Credential::Customer)
            .await?;
        Ok(())
    }

    /// Delete one of the signed-in customer's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn delete_review(&self, review_id: &ReviewId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .delete(&format!("/reviews/{review_id}"), Credential::Customer)
            .await?;
        Ok(())
    }
}
