use thiserror::Error;

/// A single star rating between 1 and 5.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct RatingValue(u8);

#[derive(Debug, Error)]
#[error("A rating must be between {} and {}, got {0}", RatingValue::min().0, RatingValue::max().0)]
pub struct InvalidRatingValue(pub i64);

impl RatingValue {
    pub const fn min() -> Self {
        Self(1)
    }

    pub const fn max() -> Self {
        Self(5)
    }

    pub fn is_valid(self) -> bool {
        self >= Self::min() && self <= Self::max()
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = InvalidRatingValue;

    fn try_from(from: i64) -> Result<Self, Self::Error> {
        u8::try_from(from)
            .ok()
            .map(Self)
            .filter(|v| v.is_valid())
            .ok_or(InvalidRatingValue(from))
    }
}

impl From<RatingValue> for u8 {
    fn from(from: RatingValue) -> Self {
        from.0
    }
}

impl From<RatingValue> for f64 {
    fn from(from: RatingValue) -> Self {
        f64::from(from.0)
    }
}

/// The mean of all ratings of a place, `0.0` without any rating.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct AvgRatingValue(f64);

impl From<f64> for AvgRatingValue {
    fn from(from: f64) -> Self {
        Self(from)
    }
}

impl From<AvgRatingValue> for f64 {
    fn from(from: AvgRatingValue) -> Self {
        from.0
    }
}

#[derive(Debug, Default, Clone)]
pub struct AvgRatingValueBuilder {
    acc: u64,
    cnt: u32,
}

impl AvgRatingValueBuilder {
    pub fn add(&mut self, val: RatingValue) {
        debug_assert!(val.is_valid());
        self.acc += u64::from(val.0);
        self.cnt += 1;
    }

    pub fn count(&self) -> u32 {
        self.cnt
    }

    pub fn build(self) -> AvgRatingValue {
        if self.cnt > 0 {
            AvgRatingValue(self.acc as f64 / f64::from(self.cnt))
        } else {
            AvgRatingValue::default()
        }
    }
}

impl std::ops::AddAssign<RatingValue> for AvgRatingValueBuilder {
    fn add_assign(&mut self, rhs: RatingValue) {
        self.add(rhs);
    }
}

impl FromIterator<RatingValue> for AvgRatingValueBuilder {
    fn from_iter<I: IntoIterator<Item = RatingValue>>(iter: I) -> Self {
        let mut builder = Self::default();
        for v in iter {
            builder += v;
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rv(v: i64) -> RatingValue {
        RatingValue::try_from(v).unwrap()
    }

    #[test]
    fn valid_rating_range() {
        assert!(RatingValue::try_from(0).is_err());
        assert!(RatingValue::try_from(6).is_err());
        assert!(RatingValue::try_from(-1).is_err());
        assert!(RatingValue::try_from(300).is_err());
        assert_eq!(3u8, rv(3).into());
    }

    #[test]
    fn average_of_nothing_is_zero() {
        let avg = AvgRatingValueBuilder::default().build();
        assert_eq!(0.0, f64::from(avg));
    }

    #[test]
    fn average_is_arithmetic_mean() {
        let builder: AvgRatingValueBuilder = [rv(5), rv(4), rv(1), rv(2)].into_iter().collect();
        assert_eq!(4, builder.count());
        assert_eq!(3.0, f64::from(builder.build()));
    }
}
