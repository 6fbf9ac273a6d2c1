use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Deserialize,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            Serialize,
            derive_more::Display,
            derive_more::From,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                Debug::fmt(&self.0, f)
            }
        }
    };
}

identifier!(
    /// Lighting scenario as named by the controller export, e.g. `Admiral Park - North 50 lux`.
    ScenarioId
);

impl ScenarioId {
    /// Lighting part of the scenario without the facility prefix, e.g. `North 50 lux`.
    #[must_use]
    pub fn label(&self) -> &str {
        self.0.rsplit_once(" - ").map_or(self.0.as_str(), |(_, lighting)| lighting)
    }
}

identifier!(
    /// Canonical bookable area, the unit that ends up on an invoice.
    AreaId
);
