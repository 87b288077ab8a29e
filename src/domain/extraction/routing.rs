//! Category router - maps a clause category to the specialist that owns it.
//!
//! Built once at startup and shared read-only by every request. Pure
//! lookup: no I/O, no side effects.

use std::collections::HashMap;

use super::categories::SpecialistId;
use super::errors::{RoutingError, UnknownCategoryError};

/// Read-only routing table from category name to specialist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRouter {
    routes: HashMap<String, SpecialistId>,
}

impl CategoryRouter {
    /// Router over the standard 41-category partition.
    ///
    /// # Panics
    ///
    /// Panics if two built-in category tables claim the same category.
    pub fn standard() -> Self {
        match Self::from_assignments(standard_assignments()) {
            Ok(router) => router,
            Err(err) => panic!("built-in category tables are inconsistent: {}", err),
        }
    }

    /// Builds a router from explicit `(category, specialist)` assignments.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::DuplicateCategory` if two specialists claim the
    /// same category, and `RoutingError::Empty` for an empty table.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = (S, SpecialistId)>,
        S: Into<String>,
    {
        let mut routes: HashMap<String, SpecialistId> = HashMap::new();

        for (category, specialist) in assignments {
            let category = category.into();
            if let Some(first) = routes.get(&category) {
                if *first != specialist {
                    return Err(RoutingError::DuplicateCategory {
                        category,
                        first: *first,
                        second: specialist,
                    });
                }
                continue;
            }
            routes.insert(category, specialist);
        }

        if routes.is_empty() {
            return Err(RoutingError::Empty);
        }

        Ok(Self { routes })
    }

    /// Route a category to its specialist.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategoryError` when the category is not in the table.
    pub fn route(&self, category: &str) -> Result<SpecialistId, UnknownCategoryError> {
        self.routes
            .get(category)
            .copied()
            .ok_or_else(|| UnknownCategoryError(category.to_string()))
    }

    /// Check whether a category is routable.
    pub fn contains(&self, category: &str) -> bool {
        self.routes.contains_key(category)
    }

    /// Categories routed to a specialist, sorted by name.
    pub fn categories_for(&self, specialist: SpecialistId) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .routes
            .iter()
            .filter(|(_, s)| **s == specialist)
            .map(|(c, _)| c.as_str())
            .collect();
        categories.sort_unstable();
        categories
    }

    /// Distinct specialists that at least one category routes to.
    pub fn targets(&self) -> Vec<SpecialistId> {
        let mut targets: Vec<SpecialistId> = self.routes.values().copied().collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    /// Number of routable categories.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no category is routable.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// `(category, specialist)` pairs from the built-in tables.
fn standard_assignments() -> impl Iterator<Item = (&'static str, SpecialistId)> {
    SpecialistId::all().iter().flat_map(|specialist| {
        specialist
            .categories()
            .iter()
            .map(move |category| (*category, *specialist))
    })
}

impl Default for CategoryRouter {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extraction::categories::{
        all_categories, CATEGORY_COUNT, IP_COMMERCIAL_CATEGORIES, RISK_LIABILITY_CATEGORIES,
        TEMPORAL_RENEWAL_CATEGORIES,
    };
    use proptest::prelude::*;

    #[test]
    fn standard_router_has_all_categories() {
        let router = CategoryRouter::standard();
        assert_eq!(router.len(), CATEGORY_COUNT);
        for category in all_categories() {
            assert!(router.contains(category), "Missing routing for {}", category);
        }
    }

    #[test]
    fn routes_each_group_to_its_specialist() {
        let router = CategoryRouter::standard();

        for category in RISK_LIABILITY_CATEGORIES {
            assert_eq!(router.route(category), Ok(SpecialistId::RiskLiability));
        }
        for category in TEMPORAL_RENEWAL_CATEGORIES {
            assert_eq!(router.route(category), Ok(SpecialistId::TemporalRenewal));
        }
        for category in IP_COMMERCIAL_CATEGORIES {
            assert_eq!(router.route(category), Ok(SpecialistId::IpCommercial));
        }
    }

    #[test]
    fn partition_sizes_are_13_11_17() {
        let router = CategoryRouter::standard();
        assert_eq!(router.categories_for(SpecialistId::RiskLiability).len(), 13);
        assert_eq!(router.categories_for(SpecialistId::TemporalRenewal).len(), 11);
        assert_eq!(router.categories_for(SpecialistId::IpCommercial).len(), 17);
    }

    #[test]
    fn known_scenarios_route_correctly() {
        let router = CategoryRouter::standard();
        assert_eq!(router.route("Governing Law"), Ok(SpecialistId::TemporalRenewal));
        assert_eq!(router.route("Cap on Liability"), Ok(SpecialistId::RiskLiability));
        assert_eq!(router.route("License Grant"), Ok(SpecialistId::IpCommercial));
    }

    #[test]
    fn unknown_category_fails() {
        let router = CategoryRouter::standard();
        let err = router.route("Nonexistent Category").unwrap_err();
        assert_eq!(err, UnknownCategoryError("Nonexistent Category".to_string()));
    }

    #[test]
    fn routing_is_case_and_punctuation_sensitive() {
        let router = CategoryRouter::standard();
        assert!(router.route("governing law").is_err());
        assert!(router.route("Non Compete").is_err());
        assert!(router.route("Governing Law ").is_err());
    }

    #[test]
    fn duplicate_claims_rejected_at_construction() {
        let result = CategoryRouter::from_assignments([
            ("Insurance", SpecialistId::RiskLiability),
            ("Insurance", SpecialistId::IpCommercial),
        ]);

        assert!(matches!(
            result,
            Err(RoutingError::DuplicateCategory {
                first: SpecialistId::RiskLiability,
                second: SpecialistId::IpCommercial,
                ..
            })
        ));
    }

    #[test]
    fn standard_tables_are_disjoint() {
        let assignments: Vec<_> = standard_assignments().collect();
        assert_eq!(assignments.len(), CATEGORY_COUNT);

        let router = CategoryRouter::from_assignments(assignments).unwrap();
        assert_eq!(router, CategoryRouter::standard());
        assert_eq!(router.len(), CATEGORY_COUNT);
    }

    #[test]
    fn empty_assignments_rejected() {
        let result = CategoryRouter::from_assignments(Vec::<(String, SpecialistId)>::new());
        assert_eq!(result, Err(RoutingError::Empty));
    }

    #[test]
    fn targets_lists_each_specialist_once() {
        let router = CategoryRouter::standard();
        assert_eq!(router.targets(), SpecialistId::all().to_vec());
    }

    proptest! {
        #[test]
        fn route_is_total_over_known_categories(index in 0usize..CATEGORY_COUNT) {
            let router = CategoryRouter::standard();
            let category = all_categories().nth(index).unwrap();
            let routed = router.route(category).unwrap();
            prop_assert!(routed.categories().contains(&category));
        }

        #[test]
        fn route_rejects_unlisted_strings(category in "[a-z ]{1,30}") {
            let router = CategoryRouter::standard();
            // Every known category starts with an uppercase letter.
            prop_assert!(router.route(&category).is_err());
        }
    }
}
