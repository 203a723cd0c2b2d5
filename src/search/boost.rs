//! Dynamic relevance boosting for reviews

use crate::models::CustomerReview;

/// Boost given to a five-star review
pub const FIVE_STAR_BOOST: f32 = 1.5;

/// Neutral boost
pub const DEFAULT_BOOST: f32 = 1.0;

/// Weight for a single review: five-star reviews count for more
pub fn five_star_boost(review: Option<&CustomerReview>) -> f32 {
    match review {
        Some(review) if review.stars == 5 => FIVE_STAR_BOOST,
        _ => DEFAULT_BOOST,
    }
}

/// Combined dynamic boost for an app, the product of its review boosts
pub fn review_boost(reviews: &[CustomerReview]) -> f32 {
    reviews
        .iter()
        .map(|review| five_star_boost(Some(review)))
        .product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_star_boost() {
        let review = CustomerReview::new("fanboy1984", 5, "Stylish!");
        assert_eq!(five_star_boost(Some(&review)), 1.5);
    }

    #[test]
    fn test_other_ratings_are_neutral() {
        let review = CustomerReview::new("BirdSlinger", 4, "LOL");
        assert_eq!(five_star_boost(Some(&review)), 1.0);
        assert_eq!(five_star_boost(None), 1.0);
    }

    #[test]
    fn test_boost_does_not_mutate() {
        let review = CustomerReview::new("lskinner", 5, "Free Bird");
        let before = review.clone();
        let _ = five_star_boost(Some(&review));
        assert_eq!(review, before);
    }

    #[test]
    fn test_review_boost_is_multiplicative() {
        let reviews = vec![
            CustomerReview::new("missing.digits", 1, "Ouch"),
            CustomerReview::new("LawyerGuy", 5, "Let's talk"),
        ];
        assert_eq!(review_boost(&reviews), 1.5);
        assert_eq!(review_boost(&[]), 1.0);

        let two_fans = vec![
            CustomerReview::new("a", 5, "great"),
            CustomerReview::new("b", 5, "great"),
        ];
        assert!((review_boost(&two_fans) - 2.25).abs() < 1e-6);
    }
}
