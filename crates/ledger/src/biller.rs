//! Biller catalog entries (read-only reference data).

use serde::{Deserialize, Serialize};

use payvault_core::BillerId;

/// A payee for bill-payment operations. Consumed, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biller {
    pub id: BillerId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub is_active: bool,
}

impl Biller {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: BillerId::new(),
            name: name.into(),
            category: category.into(),
            description: description.into(),
            is_active: true,
        }
    }
}

/// Default catalog seeded into fresh stores.
pub fn default_catalog() -> Vec<Biller> {
    vec![
        Biller::new(
            "Electricity Company",
            "Utilities",
            "Monthly electricity bill payment",
        ),
        Biller::new("Water Department", "Utilities", "Monthly water bill payment"),
        Biller::new(
            "Internet Provider",
            "Telecommunications",
            "Monthly internet service payment",
        ),
        Biller::new("Gas Company", "Utilities", "Monthly gas bill payment"),
        Biller::new(
            "Mobile Network",
            "Telecommunications",
            "Mobile phone bill payment",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_active_and_distinct() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.iter().all(|b| b.is_active));
        let mut names: Vec<&str> = catalog.iter().map(|b| b.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }
}
