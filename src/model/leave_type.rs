use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Leave categories a tenant can grant. Stored lowercase in MySQL.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Maternity,
    Paternity,
    Unpaid,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Personal => "personal",
            LeaveType::Maternity => "maternity",
            LeaveType::Paternity => "paternity",
            LeaveType::Unpaid => "unpaid",
        }
    }

    /// Fallback entitlement when the tenant policy map has no entry.
    pub fn default_days(&self) -> f64 {
        match self {
            LeaveType::Annual => 20.0,
            LeaveType::Sick => 10.0,
            LeaveType::Personal => 5.0,
            LeaveType::Maternity => 90.0,
            LeaveType::Paternity => 15.0,
            LeaveType::Unpaid => 0.0,
        }
    }

    /// The subset shown on the employee balance screen. Maternity, paternity
    /// and unpaid stay out of the display set even though allocation and
    /// reset operate on all six types.
    pub fn display_types() -> [LeaveType; 3] {
        [LeaveType::Annual, LeaveType::Sick, LeaveType::Personal]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn six_types_with_defaults() {
        let all: Vec<LeaveType> = LeaveType::iter().collect();
        assert_eq!(all.len(), 6);
        assert_eq!(LeaveType::Annual.default_days(), 20.0);
        assert_eq!(LeaveType::Sick.default_days(), 10.0);
        assert_eq!(LeaveType::Personal.default_days(), 5.0);
        assert_eq!(LeaveType::Maternity.default_days(), 90.0);
        assert_eq!(LeaveType::Paternity.default_days(), 15.0);
        assert_eq!(LeaveType::Unpaid.default_days(), 0.0);
    }

    #[test]
    fn parses_lowercase_db_values() {
        assert_eq!(LeaveType::from_str("annual").unwrap(), LeaveType::Annual);
        assert_eq!(LeaveType::from_str("unpaid").unwrap(), LeaveType::Unpaid);
        assert!(LeaveType::from_str("sabbatical").is_err());
    }

    #[test]
    fn display_set_excludes_parental_and_unpaid() {
        let shown = LeaveType::display_types();
        assert!(!shown.contains(&LeaveType::Maternity));
        assert!(!shown.contains(&LeaveType::Paternity));
        assert!(!shown.contains(&LeaveType::Unpaid));
    }
}
