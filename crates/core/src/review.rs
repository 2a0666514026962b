//! Product reviews: wire shapes, submission checks and rating summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError, ProductId, ReviewId, UserId, timestamp};
use crate::validation::FieldErrors;

/// Reviews shown per page on a product.
pub const REVIEWS_PAGE_SIZE: u32 = 5;

pub const REVIEW_TEXT_MIN: usize = 10;
pub const REVIEW_TEXT_MAX: usize = 1000;
pub const REVIEWER_NAME_MAX: usize = 100;
pub const REVIEW_TITLE_MAX: usize = 100;

/// Shown after a review is accepted; reviews go live only once approved.
pub const MODERATION_NOTICE: &str =
    "Thank you! Your review has been submitted and is awaiting moderation.";

/// A published review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReview {
    pub id: ReviewId,
    pub product_id: ProductId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_email: String,
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    pub review_text: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub is_verified_purchase: bool,
}

/// Aggregate figures computed by the API over all approved reviews.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
    /// Star value to review count. Missing stars count as zero.
    #[serde(default)]
    pub rating_distribution: BTreeMap<u8, u32>,
}

/// One row of the rating histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingBar {
    pub stars: u8,
    pub count: u32,
    pub percentage: f64,
}

impl ReviewStats {
    /// Histogram rows from 5 stars down to 1.
    #[must_use]
    pub fn bars(&self) -> Vec<RatingBar> {
        (1..=5u8)
            .rev()
            .map(|stars| {
                let count = self.rating_distribution.get(&stars).copied().unwrap_or(0);
                let percentage = if self.total_reviews == 0 {
                    0.0
                } else {
                    f64::from(count) / f64::from(self.total_reviews) * 100.0
                };
                RatingBar {
                    stars,
                    count,
                    percentage,
                }
            })
            .collect()
    }

    /// Average rounded to one decimal, e.g. "4.3".
    #[must_use]
    pub fn average_display(&self) -> String {
        format!("{:.1}", self.average_rating)
    }
}

/// `GET /products/{id}/reviews` response body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    #[serde(default)]
    pub reviews: Vec<ProductReview>,
    #[serde(default)]
    pub stats: ReviewStats,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_previous_page: bool,
}

impl ReviewPage {
    /// What the product page shows when reviews cannot be loaded.
    #[must_use]
    pub fn empty(page: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: REVIEWS_PAGE_SIZE,
            ..Self::default()
        }
    }
}

const fn first_page() -> u32 {
    1
}

const fn default_page_size() -> u32 {
    REVIEWS_PAGE_SIZE
}

/// Inputs on the review form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewField {
    Rating,
    Title,
    ReviewText,
    ReviewerName,
    ReviewerEmail,
}

impl ReviewField {
    /// Form input name, also the key in [`FieldErrors`].
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Title => "title",
            Self::ReviewText => "review_text",
            Self::ReviewerName => "reviewer_name",
            Self::ReviewerEmail => "reviewer_email",
        }
    }
}

/// Review form contents as typed by the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_email: String,
}

/// Body for `POST /products/{id}/reviews`, built only from a valid draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub review_text: String,
    pub reviewer_name: String,
    pub reviewer_email: Email,
}

impl ReviewDraft {
    /// Check every field and produce a trimmed submission.
    ///
    /// # Errors
    ///
    /// Returns one message per failing [`ReviewField`].
    pub fn validate(&self) -> Result<NewReview, FieldErrors> {
        let mut errors = FieldErrors::new();

        let rating = self.rating.filter(|r| (1..=5).contains(r));
        if rating.is_none() {
            errors.add(ReviewField::Rating.key(), "Please select a rating");
        }

        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if title.is_some_and(|t| t.chars().count() > REVIEW_TITLE_MAX) {
            errors.add(
                ReviewField::Title.key(),
                format!("Title cannot exceed {REVIEW_TITLE_MAX} characters"),
            );
        }

        let text = self.review_text.trim();
        let text_len = text.chars().count();
        if text.is_empty() {
            errors.add(ReviewField::ReviewText.key(), "Review text is required");
        } else if text_len < REVIEW_TEXT_MIN {
            errors.add(
                ReviewField::ReviewText.key(),
                format!("Review must be at least {REVIEW_TEXT_MIN} characters long"),
            );
        } else if text_len > REVIEW_TEXT_MAX {
            errors.add(
                ReviewField::ReviewText.key(),
                format!("Review cannot exceed {REVIEW_TEXT_MAX} characters"),
            );
        }

        let name = self.reviewer_name.trim();
        if name.is_empty() {
            errors.add(ReviewField::ReviewerName.key(), "Name is required");
        } else if name.chars().count() > REVIEWER_NAME_MAX {
            errors.add(
                ReviewField::ReviewerName.key(),
                format!("Name cannot exceed {REVIEWER_NAME_MAX} characters"),
            );
        }

        let email = Email::parse(&self.reviewer_email).map_err(|e| match e {
            EmailError::Empty => "Email is required".to_string(),
            EmailError::Malformed => "Please enter a valid email address".to_string(),
            EmailError::TooLong { max } => format!("Email cannot exceed {max} characters"),
        });
        let email = match email {
            Ok(email) => Some(email),
            Err(message) => {
                errors.add(ReviewField::ReviewerEmail.key(), message);
                None
            }
        };

        match (rating, email) {
            (Some(rating), Some(reviewer_email)) if errors.is_empty() => Ok(NewReview {
                rating,
                title: title.map(str::to_owned),
                review_text: text.to_owned(),
                reviewer_name: name.to_owned(),
                reviewer_email,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ReviewDraft {
        ReviewDraft {
            rating: Some(4),
            title: Some("  Lovely  ".to_string()),
            review_text: "  Great quality, fast delivery.  ".to_string(),
            reviewer_name: " Sam ".to_string(),
            reviewer_email: "sam@example.com".to_string(),
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_valid_draft_is_trimmed() {
        let review = draft().validate().unwrap();
        assert_eq!(review.rating, 4);
        assert_eq!(review.title.as_deref(), Some("Lovely"));
        assert_eq!(review.review_text, "Great quality, fast delivery.");
        assert_eq!(review.reviewer_name, "Sam");
    }

    #[test]
    fn test_rating_required() {
        for rating in [None, Some(0), Some(6)] {
            let errors = ReviewDraft { rating, ..draft() }.validate().unwrap_err();
            assert_eq!(errors.get("rating"), Some("Please select a rating"));
        }
    }

    #[test]
    fn test_review_text_bounds() {
        let exact_min = ReviewDraft {
            review_text: "a".repeat(REVIEW_TEXT_MIN),
            ..draft()
        };
        assert!(exact_min.validate().is_ok());

        let exact_max = ReviewDraft {
            review_text: "a".repeat(REVIEW_TEXT_MAX),
            ..draft()
        };
        assert!(exact_max.validate().is_ok());

        let short = ReviewDraft {
            review_text: "a".repeat(REVIEW_TEXT_MIN - 1),
            ..draft()
        };
        assert!(short.validate().unwrap_err().has("review_text"));

        let long = ReviewDraft {
            review_text: "a".repeat(REVIEW_TEXT_MAX + 1),
            ..draft()
        };
        assert!(long.validate().unwrap_err().has("review_text"));
    }

    #[test]
    fn test_padded_short_text_rejected() {
        let padded = ReviewDraft {
            review_text: format!("   {}   ", "a".repeat(9)),
            ..draft()
        };
        assert!(padded.validate().unwrap_err().has("review_text"));
    }

    #[test]
    fn test_email_shapes() {
        for bad in ["", "sam", "sam@example", "sam @example.com", "a@b@c.com"] {
            let d = ReviewDraft {
                reviewer_email: bad.to_string(),
                ..draft()
            };
            assert!(d.validate().unwrap_err().has("reviewer_email"), "{bad:?}");
        }
    }

    #[test]
    fn test_errors_collected_per_field() {
        let errors = ReviewDraft::default().validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(!errors.has("title"));
    }

    #[test]
    fn test_blank_title_is_omitted() {
        let review = ReviewDraft {
            title: Some("   ".to_string()),
            ..draft()
        }
        .validate()
        .unwrap();
        assert_eq!(review.title, None);
        let json = serde_json::to_value(&review).unwrap();
        assert!(json.get("title").is_none());
        assert_eq!(json["reviewerEmail"], "sam@example.com");
    }

    // =========================================================================
    // Stats
    // =========================================================================

    #[test]
    fn test_bars_order_and_percentages() {
        let stats: ReviewStats = serde_json::from_str(
            r#"{"averageRating": 4.26, "totalReviews": 4, "ratingDistribution": {"5": 2, "4": 1, "2": 1}}"#,
        )
        .unwrap();
        let bars = stats.bars();
        assert_eq!(
            bars.iter().map(|b| b.stars).collect::<Vec<_>>(),
            vec![5, 4, 3, 2, 1]
        );
        assert!((bars.first().unwrap().percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(bars.get(2).unwrap().count, 0);
        assert_eq!(stats.average_display(), "4.3");
    }

    #[test]
    fn test_bars_with_no_reviews() {
        let bars = ReviewStats::default().bars();
        assert!(bars.iter().all(|b| b.percentage == 0.0));
    }

    #[test]
    fn test_empty_page_fallback() {
        let page = ReviewPage::empty(0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, REVIEWS_PAGE_SIZE);
        assert!(page.reviews.is_empty());
    }
}
