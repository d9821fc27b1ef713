//! Stable-id newtypes shared across the planning crates.
//!
//! Follows a `shared::types` newtype-over-primitive pattern
//! (`Price(Decimal)`, `OrderId(String)`), without the unsound raw-pointer
//! `PriceRef`/`Container` helpers that accompanied them there.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            pub fn new(value: $inner) -> Self {
                Self(value)
            }

            pub fn get(&self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(PlanningId, i64);
id_newtype!(TaskId, i64);
id_newtype!(RowId, i64);
id_newtype!(AffairId, i64);

/// Display type of a planning's rows, selected by a single per-planning
/// flag (`type_donnees` in the reference loader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Operator,
    Workcenter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_json() {
        let id = TaskId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn row_kind_serializes_snake_case() {
        let json = serde_json::to_string(&RowKind::Workcenter).unwrap();
        assert_eq!(json, "\"workcenter\"");
    }
}
