use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric id used by the external reviews provider.
pub type ExternalProductId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalReview {
    pub reviewer_name: String,
    pub text: String,
    pub rating: f64,
    pub review_date: String,
    pub review_id: i64,
}

/// Product record as published by the external reviews provider.
///
/// The list endpoint may omit `reviews`; the single-product endpoint carries
/// the full set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProduct {
    pub product_id: ExternalProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: Vec<ExternalReview>,
}

impl ExternalProduct {
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn product_info(&self) -> ProductInfo {
        ProductInfo {
            product_id: self.product_id,
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub product_id: ExternalProductId,
    pub name: String,
    pub category: String,
}

/// Which tier produced a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSource {
    External,
    Fallback,
}

impl ReviewSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllReviewsResponse {
    pub reviews: Vec<ExternalReview>,
    pub product_info: ProductInfo,
    pub source: ReviewSource,
}

impl AllReviewsResponse {
    pub fn from_external(product: &ExternalProduct) -> Self {
        Self {
            reviews: product.reviews.clone(),
            product_info: product.product_info(),
            source: ReviewSource::External,
        }
    }
}

/// One review, flattened next to the product it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalReviewResponse {
    #[serde(flatten)]
    pub review: ExternalReview,
    pub product_info: ProductInfo,
    pub source: ReviewSource,
}

pub const DEFAULT_REVIEWER_NAME: &str = "Anonymous";
pub const DEFAULT_REVIEW_TEXT: &str = "No review available";

/// Body returned by the mock reviews API.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MockReviewsResponse {
    #[serde(default)]
    pub reviews: Vec<MockReview>,
    #[serde(default)]
    pub stats: Option<Value>,
}

/// Loosely typed review from the mock API. Every field is optional, a few
/// spellings are accepted and values of the wrong type are treated as absent,
/// so one odd review never rejects the whole payload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct MockReview {
    pub reviewer_name: Option<String>,
    pub text: Option<String>,
    pub rating: Option<f64>,
    pub review_date: Option<String>,
    pub review_id: Option<Value>,
}

const REVIEWER_KEYS: [&str; 3] = ["reviewerName", "author", "userName"];
const TEXT_KEYS: [&str; 3] = ["text", "comment", "content"];
const DATE_KEYS: [&str; 3] = ["reviewDate", "date", "createdAt"];
const ID_KEYS: [&str; 2] = ["reviewId", "id"];

impl From<Value> for MockReview {
    fn from(value: Value) -> Self {
        Self {
            reviewer_name: first_present(&value, &REVIEWER_KEYS).and_then(loose_string),
            text: first_present(&value, &TEXT_KEYS).and_then(loose_string),
            rating: first_present(&value, &["rating"]).and_then(loose_rating),
            review_date: first_present(&value, &DATE_KEYS).and_then(loose_string),
            review_id: first_present(&value, &ID_KEYS).cloned(),
        }
    }
}

impl MockReview {
    /// Fills missing attributes with defaults. `index` is the review's position
    /// in the mock payload and stands in for an id that is absent or not numeric.
    pub fn into_external(self, index: usize) -> ExternalReview {
        let review_id = self.review_id.as_ref().and_then(parse_review_id).unwrap_or(index as i64);

        ExternalReview {
            reviewer_name: non_blank(self.reviewer_name)
                .unwrap_or_else(|| DEFAULT_REVIEWER_NAME.to_string()),
            text: non_blank(self.text).unwrap_or_else(|| DEFAULT_REVIEW_TEXT.to_string()),
            rating: self.rating.unwrap_or(0.0),
            review_date: self.review_date.unwrap_or_default(),
            review_id,
        }
    }
}

impl MockReviewsResponse {
    pub fn into_all_reviews(self, product_info: ProductInfo) -> AllReviewsResponse {
        AllReviewsResponse {
            reviews: self
                .reviews
                .into_iter()
                .enumerate()
                .map(|(index, review)| review.into_external(index))
                .collect(),
            product_info,
            source: ReviewSource::Fallback,
        }
    }
}

fn parse_review_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => {
            number.as_i64().or_else(|| number.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64))
        }
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// First alias carrying a non-null value, in declaration order.
fn first_present<'a>(review: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| review.get(*key).filter(|value| !value.is_null()))
}

fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => Some(raw.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn loose_rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    rating.filter(|rating| rating.is_finite())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
