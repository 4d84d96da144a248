//! Product reviews panel.
//!
//! Loads one page of a product's reviews with aggregate stats and lets the
//! signed-in customer create, edit or delete their own review. Every
//! successful mutation reloads the current page, so the stats (average,
//! distribution) always match the server.
//!
//! "One review per customer" is checked against the loaded page only; the
//! backend has the final word.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use shopfront_core::{ProductId, Rating, RatingError, ReviewId, UserId};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::api::{
    ApiClient, ApiError, Credential, Pagination, Review, ReviewPage, ReviewStats, UserProfile,
};
use crate::notify::{SharedNotifier, Toast};
use crate::storage::{keys, read_json};

/// Reviews per page.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Errors from review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Writing reviews needs a customer session.
    #[error("Please login to write a review")]
    NotAuthenticated,

    /// The comment was blank.
    #[error("Please write a comment")]
    EmptyComment,

    /// The rating was outside 1-5.
    #[error(transparent)]
    InvalidRating(#[from] RatingError),

    /// The customer already has a review on this product.
    #[error("You have already reviewed this product")]
    AlreadyReviewed,

    /// The review belongs to someone else or is not loaded.
    #[error("You can only modify your own review")]
    NotOwner,

    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Review operations used by [`ReviewsPanel`].
pub trait ReviewBackend: Send + Sync {
    /// Id of the signed-in customer, if any.
    fn current_user(&self) -> Option<UserId>;

    /// Fetch one page of reviews.
    fn page(
        &self,
        product_id: &ProductId,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<ReviewPage, ApiError>> + Send;

    /// Post a review.
    fn create(
        &self,
        product_id: &ProductId,
        rating: Rating,
        comment: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Edit a review.
    fn update(
        &self,
        review_id: &ReviewId,
        rating: Rating,
        comment: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete a review.
    fn delete(&self, review_id: &ReviewId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl ReviewBackend for ApiClient {
    fn current_user(&self) -> Option<UserId> {
        if !self.has_token(Credential::Customer) {
            return None;
        }
        read_json::<UserProfile>(self.local_storage().as_ref(), keys::USER).map(|user| user.id)
    }

    fn page(
        &self,
        product_id: &ProductId,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<ReviewPage, ApiError>> + Send {
        self.product_reviews(product_id, page, limit)
    }

    fn create(
        &self,
        product_id: &ProductId,
        rating: Rating,
        comment: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.create_review(product_id, rating, comment)
    }

    fn update(
        &self,
        review_id: &ReviewId,
        rating: Rating,
        comment: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.update_review(review_id, rating, comment)
    }

    fn delete(&self, review_id: &ReviewId) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.delete_review(review_id)
    }
}

/// Check a review form without touching the network.
///
/// # Errors
///
/// Returns [`ReviewError::InvalidRating`] or [`ReviewError::EmptyComment`].
pub fn validate_form(rating: i64, comment: &str) -> Result<(Rating, &str), ReviewError> {
    let rating = Rating::new(rating)?;
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(ReviewError::EmptyComment);
    }
    Ok((rating, comment))
}

#[derive(Debug, Default)]
struct PanelState {
    reviews: Vec<Review>,
    pagination: Pagination,
    stats: ReviewStats,
}

/// Reviews of one product.
pub struct ReviewsPanel<B> {
    backend: B,
    notifier: SharedNotifier,
    product_id: ProductId,
    limit: u32,
    state: RwLock<PanelState>,
}

impl<B: ReviewBackend> ReviewsPanel<B> {
    /// Create an empty panel for a product.
    pub fn new(backend: B, notifier: SharedNotifier, product_id: ProductId) -> Self {
        Self {
            backend,
            notifier,
            product_id,
            limit: DEFAULT_PAGE_SIZE,
            state: RwLock::new(PanelState::default()),
        }
    }

    /// Use a different page size.
    #[must_use]
    pub fn with_page_size(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// The product being reviewed.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Loaded reviews.
    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        self.read().reviews.clone()
    }

    /// Position of the loaded page.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        self.read().pagination
    }

    /// Aggregate stats from the last load.
    #[must_use]
    pub fn stats(&self) -> ReviewStats {
        self.read().stats.clone()
    }

    /// The signed-in customer's review among the loaded ones.
    #[must_use]
    pub fn my_review(&self) -> Option<Review> {
        let me = self.backend.current_user()?;
        self.read().reviews.iter().find(|r| r.user.id == me).cloned()
    }

    /// Whether the signed-in customer may edit or delete `review`.
    #[must_use]
    pub fn can_edit(&self, review: &Review) -> bool {
        self.backend
            .current_user()
            .is_some_and(|me| review.user.id == me)
    }

    /// Load a page (1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the loaded page is kept.
    #[instrument(skip(self), fields(product_id = %self.product_id))]
    pub async fn load(&self, page: u32) -> Result<(), ReviewError> {
        let page = self
            .backend
            .page(&self.product_id, page.max(1), self.limit)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load reviews"))?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.reviews = page.reviews;
        state.pagination = page.pagination;
        state.stats = page.stats;
        Ok(())
    }

    /// Reload the current page.
    ///
    /// # Errors
    ///
    /// See [`ReviewsPanel::load`].
    pub async fn reload(&self) -> Result<(), ReviewError> {
        let page = self.pagination().page;
        self.load(page).await
    }

    /// Load the next page, if any. Returns whether a page was loaded.
    ///
    /// # Errors
    ///
    /// See [`ReviewsPanel::load`].
    pub async fn next_page(&self) -> Result<bool, ReviewError> {
        let Pagination { page, pages, .. } = self.pagination();
        if page >= pages {
            return Ok(false);
        }
        self.load(page + 1).await.map(|()| true)
    }

    /// Load the previous page, if any. Returns whether a page was loaded.
    ///
    /// # Errors
    ///
    /// See [`ReviewsPanel::load`].
    pub async fn prev_page(&self) -> Result<bool, ReviewError> {
        let page = self.pagination().page;
        if page <= 1 {
            return Ok(false);
        }
        self.load(page - 1).await.map(|()| true)
    }

    /// Post a new review, then reload.
    ///
    /// # Errors
    ///
    /// Validation failures are reported without any network call.
    #[instrument(skip(self, comment), fields(product_id = %self.product_id))]
    pub async fn submit(&self, rating: i64, comment: &str) -> Result<(), ReviewError> {
        let (rating, comment) = self.check_form(rating, comment)?;
        if self.my_review().is_some() {
            return Err(self.reject(ReviewError::AlreadyReviewed));
        }

        self.backend
            .create(&self.product_id, rating, comment)
            .await
            .map_err(|e| self.reject(e.into()))?;
        self.notifier.notify(Toast::success("Review submitted"));
        self.reload().await
    }

    /// Edit the customer's own review, then reload.
    ///
    /// # Errors
    ///
    /// Validation and ownership failures are reported without any network
    /// call.
    #[instrument(skip(self, comment), fields(review_id = %review_id))]
    pub async fn edit(
        &self,
        review_id: &ReviewId,
        rating: i64,
        comment: &str,
    ) -> Result<(), ReviewError> {
        let (rating, comment) = self.check_form(rating, comment)?;
        self.check_owner(review_id)?;

        self.backend
            .update(review_id, rating, comment)
            .await
            .map_err(|e| self.reject(e.into()))?;
        self.notifier.notify(Toast::success("Review updated"));
        self.reload().await
    }

    /// Delete the customer's own review, then reload.
    ///
    /// # Errors
    ///
    /// Ownership failures are reported without any network call.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn delete(&self, review_id: &ReviewId) -> Result<(), ReviewError> {
        if self.backend.current_user().is_none() {
            return Err(self.reject(ReviewError::NotAuthenticated));
        }
        self.check_owner(review_id)?;

        self.backend
            .delete(review_id)
            .await
            .map_err(|e| self.reject(e.into()))?;
        self.notifier.notify(Toast::success("Review deleted"));
        self.reload().await
    }

    fn check_form<'c>(
        &self,
        rating: i64,
        comment: &'c str,
    ) -> Result<(Rating, &'c str), ReviewError> {
        if self.backend.current_user().is_none() {
            return Err(self.reject(ReviewError::NotAuthenticated));
        }
        validate_form(rating, comment).map_err(|e| self.reject(e))
    }

    fn check_owner(&self, review_id: &ReviewId) -> Result<(), ReviewError> {
        let owned = self
            .read()
            .reviews
            .iter()
            .find(|r| r.id == *review_id)
            .is_some_and(|r| self.can_edit(r));
        if owned {
            Ok(())
        } else {
            Err(self.reject(ReviewError::NotOwner))
        }
    }

    /// Surface an error as a toast and hand it back.
    fn reject(&self, error: ReviewError) -> ReviewError {
        let message = match &error {
            ReviewError::Api(e) => e.user_message(),
            ReviewError::InvalidRating(_) => "Please select a rating between 1 and 5".to_string(),
            other => other.to_string(),
        };
        self.notifier.notify(Toast::error(message));
        error
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PanelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::notify::ToastLog;

    /// Backend holding reviews in memory and recording calls.
    #[derive(Default)]
    struct FakeReviews {
        me: Option<UserId>,
        reviews: Mutex<Vec<Review>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeReviews {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ReviewBackend for Arc<FakeReviews> {
        fn current_user(&self) -> Option<UserId> {
            self.me.clone()
        }

        async fn page(
            &self,
            _product_id: &ProductId,
            page: u32,
            limit: u32,
        ) -> Result<ReviewPage, ApiError> {
            self.calls.lock().unwrap().push(format!("page {page}"));
            let all = self.reviews.lock().unwrap().clone();
            let total = u32::try_from(all.len()).unwrap();
            let pages = total.div_ceil(limit).max(1);
            let start = usize::try_from((page - 1) * limit).unwrap();
            let reviews = all.into_iter().skip(start).take(usize::try_from(limit).unwrap()).collect();
            let sum: u32 = self
                .reviews
                .lock()
                .unwrap()
                .iter()
                .map(|r| u32::from(r.rating.stars()))
                .sum();
            Ok(ReviewPage {
                reviews,
                pagination: Pagination { page, pages, total },
                stats: ReviewStats {
                    average_rating: if total == 0 {
                        0.0
                    } else {
                        f64::from(sum) / f64::from(total)
                    },
                    total_reviews: total,
                    ..ReviewStats::default()
                },
            })
        }

        async fn create(
            &self,
            _product_id: &ProductId,
            rating: Rating,
            comment: &str,
        ) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push("create".to_string());
            let mut reviews = self.reviews.lock().unwrap();
            let id = format!("r{}", reviews.len() + 1);
            reviews.push(review(&id, self.me.as_ref().unwrap().as_str(), rating.stars(), comment));
            Ok(())
        }

        async fn update(
            &self,
            review_id: &ReviewId,
            rating: Rating,
            comment: &str,
        ) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(format!("update {review_id}"));
            let mut reviews = self.reviews.lock().unwrap();
            if let Some(r) = reviews.iter_mut().find(|r| r.id == *review_id) {
                r.rating = rating;
                comment.clone_into(&mut r.comment);
            }
            Ok(())
        }

        async fn delete(&self, review_id: &ReviewId) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(format!("delete {review_id}"));
            self.reviews.lock().unwrap().retain(|r| r.id != *review_id);
            Ok(())
        }
    }

    fn review(id: &str, user: &str, stars: u8, comment: &str) -> Review {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "user": {"_id": user, "name": user},
            "rating": stars,
            "comment": comment,
        }))
        .unwrap()
    }

    type Fixture = (ReviewsPanel<Arc<FakeReviews>>, Arc<FakeReviews>, Arc<ToastLog>);

    fn panel(me: Option<&str>, existing: Vec<Review>) -> Fixture {
        let backend = Arc::new(FakeReviews {
            me: me.map(UserId::new),
            reviews: Mutex::new(existing),
            ..FakeReviews::default()
        });
        let log = Arc::new(ToastLog::new());
        let panel = ReviewsPanel::new(backend.clone(), log.clone(), ProductId::new("p1"));
        (panel, backend, log)
    }

    #[test]
    fn test_validate_form() {
        assert!(validate_form(5, "Great fit").is_ok());
        assert!(matches!(validate_form(0, "ok"), Err(ReviewError::InvalidRating(_))));
        assert!(matches!(validate_form(6, "ok"), Err(ReviewError::InvalidRating(_))));
        assert!(matches!(validate_form(3, "  \n"), Err(ReviewError::EmptyComment)));
    }

    #[tokio::test]
    async fn test_empty_comment_makes_no_call() {
        let (panel, backend, log) = panel(Some("u1"), Vec::new());
        let err = panel.submit(4, "   ").await.unwrap_err();
        assert!(matches!(err, ReviewError::EmptyComment));
        assert!(backend.calls().is_empty());
        assert!(log.contains("Please write a comment"));
    }

    #[tokio::test]
    async fn test_guest_cannot_submit() {
        let (panel, backend, log) = panel(None, Vec::new());
        let err = panel.submit(4, "Nice").await.unwrap_err();
        assert!(matches!(err, ReviewError::NotAuthenticated));
        assert!(backend.calls().is_empty());
        assert!(log.contains("Please login to write a review"));
    }

    #[tokio::test]
    async fn test_submit_reloads_page_and_stats() {
        let (panel, backend, _) = panel(Some("u1"), vec![review("r0", "u2", 2, "Meh")]);
        panel.load(1).await.unwrap();
        assert_eq!(panel.stats().total_reviews, 1);

        panel.submit(4, "  Lovely fabric ").await.unwrap();
        assert_eq!(backend.calls(), vec!["page 1", "create", "page 1"]);
        assert_eq!(panel.stats().total_reviews, 2);
        assert!((panel.stats().average_rating - 3.0).abs() < f64::EPSILON);

        let mine = panel.my_review().unwrap();
        assert_eq!(mine.comment, "Lovely fabric");
    }

    #[tokio::test]
    async fn test_one_review_per_customer() {
        let (panel, backend, log) = panel(Some("u1"), vec![review("r1", "u1", 5, "Great")]);
        panel.load(1).await.unwrap();

        let err = panel.submit(3, "Again").await.unwrap_err();
        assert!(matches!(err, ReviewError::AlreadyReviewed));
        assert_eq!(backend.calls(), vec!["page 1"]);
        assert!(log.contains("You have already reviewed this product"));
    }

    #[tokio::test]
    async fn test_only_own_review_is_editable() {
        let (panel, backend, _) = panel(
            Some("u1"),
            vec![review("r1", "u1", 5, "Great"), review("r2", "u2", 1, "Bad")],
        );
        panel.load(1).await.unwrap();

        let reviews = panel.reviews();
        assert!(panel.can_edit(&reviews[0]));
        assert!(!panel.can_edit(&reviews[1]));

        let err = panel.delete(&ReviewId::new("r2")).await.unwrap_err();
        assert!(matches!(err, ReviewError::NotOwner));

        panel.edit(&ReviewId::new("r1"), 4, "Good").await.unwrap();
        assert_eq!(panel.my_review().unwrap().rating.stars(), 4);

        panel.delete(&ReviewId::new("r1")).await.unwrap();
        assert!(panel.my_review().is_none());
        assert_eq!(
            backend.calls(),
            vec!["page 1", "update r1", "page 1", "delete r1", "page 1"]
        );
    }

    #[tokio::test]
    async fn test_pagination() {
        let existing = (1..=7)
            .map(|i| review(&format!("r{i}"), &format!("u{i}"), 5, "ok"))
            .collect();
        let (panel, _, _) = panel(None, existing);
        let panel = panel.with_page_size(3);

        panel.load(1).await.unwrap();
        assert_eq!(panel.pagination().pages, 3);
        assert!(!panel.prev_page().await.unwrap());
        assert!(panel.next_page().await.unwrap());
        assert!(panel.next_page().await.unwrap());
        assert_eq!(panel.reviews().len(), 1);
        assert!(!panel.next_page().await.unwrap());
    }
}
