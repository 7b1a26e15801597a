//! Rating bounds and aggregation math shared by session aggregates and tutor
//! profile averages.

/// Lowest allowed rating.
pub const MIN_RATING: i16 = 1;

/// Highest allowed rating.
pub const MAX_RATING: i16 = 5;

/// Maximum review text length.
pub const MAX_REVIEW_LEN: usize = 1000;

/// Validate a 1-5 star rating.
pub fn validate_rating(rating: i16) -> Result<(), String> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        ))
    }
}

/// Round to one decimal place (the precision all published averages use).
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean of per-student star ratings, rounded to one decimal.
/// `None` when there are no ratings yet.
pub fn mean_rating(ratings: &[i16]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    Some(round_one_decimal(sum as f64 / ratings.len() as f64))
}

/// Mean of already-aggregated session ratings, rounded to one decimal.
pub fn mean_of_means(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(round_one_decimal(sum / values.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_accepted() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
    }

    #[test]
    fn out_of_bounds_rejected() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-3).is_err());
    }

    #[test]
    fn mean_rounds_to_one_decimal() {
        // (5 + 4 + 4) / 3 = 4.333... -> 4.3
        assert_eq!(mean_rating(&[5, 4, 4]), Some(4.3));
        // (5 + 4) / 2 = 4.5
        assert_eq!(mean_rating(&[5, 4]), Some(4.5));
    }

    #[test]
    fn empty_mean_is_none() {
        assert_eq!(mean_rating(&[]), None);
        assert_eq!(mean_of_means(&[]), None);
    }

    #[test]
    fn single_rating_is_itself() {
        assert_eq!(mean_rating(&[3]), Some(3.0));
    }

    #[test]
    fn mean_of_means_rounds() {
        assert_eq!(mean_of_means(&[4.5, 3.0, 5.0]), Some(4.2));
    }
}
