use std::fmt::{Debug, Display, Formatter};

use chrono::TimeDelta;

use crate::quantity::Quantity;

pub type Hours = Quantity<0, 1, 0>;

impl From<TimeDelta> for Hours {
    fn from(time_delta: TimeDelta) -> Self {
        Self::new(time_delta.as_seconds_f64() / 3600.0)
    }
}

impl Hours {
    /// Whole minutes, as printed on invoices.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn round_to_minutes(self) -> i64 {
        (self.0.0 * 60.0).round() as i64
    }
}

impl Display for Hours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} h", self.0.0)
    }
}

impl Debug for Hours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}h", self.0.0)
    }
}
