use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

/// Amount in the billing currency; no currency symbol is attached.
pub type Cost = Quantity<0, 0, 1>;

impl Cost {
    /// Round to whole cents for invoicing.
    pub fn round_to_cents(self) -> Self {
        Self::new((self.0.0 * 100.0).round() / 100.0)
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0.0)
    }
}

impl Debug for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0.0)
    }
}
