//! Clause categories and the specialists that own them.
//!
//! The 41 categories are split into three disjoint groups, one per
//! specialist. Names are matched exactly: case and punctuation matter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk & liability categories (13).
pub const RISK_LIABILITY_CATEGORIES: &[&str] = &[
    "Uncapped Liability",
    "Cap on Liability",
    "Liquidated Damages",
    "Insurance",
    "Warranty Duration",
    "Audit Rights",
    "Non-Disparagement",
    "Covenant Not to Sue",
    "Third Party Beneficiary",
    "Most Favored Nation",
    "Change of Control",
    "Post-Termination Services",
    "Minimum Commitment",
];

/// Temporal & renewal categories (11).
pub const TEMPORAL_RENEWAL_CATEGORIES: &[&str] = &[
    "Document Name",
    "Parties",
    "Agreement Date",
    "Effective Date",
    "Expiration Date",
    "Renewal Term",
    "Notice Period to Terminate Renewal",
    "Termination for Convenience",
    "Anti-Assignment",
    "Rofr/Rofo/Rofn",
    "Governing Law",
];

/// IP & commercial categories (17).
pub const IP_COMMERCIAL_CATEGORIES: &[&str] = &[
    "Ip Ownership Assignment",
    "Joint Ip Ownership",
    "License Grant",
    "Non-Transferable License",
    "Affiliate License-Licensor",
    "Affiliate License-Licensee",
    "Unlimited/All-You-Can-Eat-License",
    "Irrevocable Or Perpetual License",
    "Source Code Escrow",
    "Exclusivity",
    "Non-Compete",
    "No-Solicit Of Customers",
    "No-Solicit Of Employees",
    "Competitive Restriction Exception",
    "Revenue/Profit Sharing",
    "Price Restrictions",
    "Volume Restriction",
];

/// Total number of known categories.
pub const CATEGORY_COUNT: usize = 41;

/// Returns every known category, grouped by specialist in routing order.
pub fn all_categories() -> impl Iterator<Item = &'static str> {
    SpecialistId::all()
        .iter()
        .flat_map(|specialist| specialist.categories().iter().copied())
}

/// Identifier of a routed specialist.
///
/// Closed set: the router can only ever dispatch to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistId {
    RiskLiability,
    TemporalRenewal,
    IpCommercial,
}

impl SpecialistId {
    /// Returns all specialists in canonical order.
    pub fn all() -> &'static [SpecialistId] {
        &[
            SpecialistId::RiskLiability,
            SpecialistId::TemporalRenewal,
            SpecialistId::IpCommercial,
        ]
    }

    /// Wire name, also used as the registry key and trace value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistId::RiskLiability => "risk_liability",
            SpecialistId::TemporalRenewal => "temporal_renewal",
            SpecialistId::IpCommercial => "ip_commercial",
        }
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SpecialistId::RiskLiability => "Risk & Liability",
            SpecialistId::TemporalRenewal => "Temporal & Renewal",
            SpecialistId::IpCommercial => "IP & Commercial",
        }
    }

    /// Categories owned by this specialist.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            SpecialistId::RiskLiability => RISK_LIABILITY_CATEGORIES,
            SpecialistId::TemporalRenewal => TEMPORAL_RENEWAL_CATEGORIES,
            SpecialistId::IpCommercial => IP_COMMERCIAL_CATEGORIES,
        }
    }
}

impl fmt::Display for SpecialistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised specialist name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown specialist: {0}")]
pub struct UnknownSpecialistError(pub String);

impl FromStr for SpecialistId {
    type Err = UnknownSpecialistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecialistId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownSpecialistError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn group_sizes_match_partition() {
        assert_eq!(RISK_LIABILITY_CATEGORIES.len(), 13);
        assert_eq!(TEMPORAL_RENEWAL_CATEGORIES.len(), 11);
        assert_eq!(IP_COMMERCIAL_CATEGORIES.len(), 17);
        assert_eq!(all_categories().count(), CATEGORY_COUNT);
    }

    #[test]
    fn groups_are_disjoint() {
        let unique: HashSet<&str> = all_categories().collect();
        assert_eq!(unique.len(), CATEGORY_COUNT);
    }

    #[test]
    fn specialist_id_parses_wire_names() {
        for id in SpecialistId::all() {
            assert_eq!(id.as_str().parse::<SpecialistId>().unwrap(), *id);
        }
        assert!("orchestrator".parse::<SpecialistId>().is_err());
    }

    #[test]
    fn specialist_id_serializes_snake_case() {
        let json = serde_json::to_string(&SpecialistId::IpCommercial).unwrap();
        assert_eq!(json, "\"ip_commercial\"");
    }
}
