//! Merchant categories the classifier was trained on

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of merchant-category labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Entertainment,
    FoodDining,
    GasTransport,
    GroceryNet,
    GroceryPos,
    HealthFitness,
    Home,
    KidsPets,
    MiscNet,
    MiscPos,
    PersonalCare,
    ShoppingNet,
    ShoppingPos,
    Travel,
}

impl Category {
    pub const COUNT: usize = 14;

    /// Display order; also the order of the one-hot encoding block
    pub const ALL: [Category; Category::COUNT] = [
        Category::Entertainment,
        Category::FoodDining,
        Category::GasTransport,
        Category::GroceryNet,
        Category::GroceryPos,
        Category::HealthFitness,
        Category::Home,
        Category::KidsPets,
        Category::MiscNet,
        Category::MiscPos,
        Category::PersonalCare,
        Category::ShoppingNet,
        Category::ShoppingPos,
        Category::Travel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Entertainment => "entertainment",
            Category::FoodDining => "food_dining",
            Category::GasTransport => "gas_transport",
            Category::GroceryNet => "grocery_net",
            Category::GroceryPos => "grocery_pos",
            Category::HealthFitness => "health_fitness",
            Category::Home => "home",
            Category::KidsPets => "kids_pets",
            Category::MiscNet => "misc_net",
            Category::MiscPos => "misc_pos",
            Category::PersonalCare => "personal_care",
            Category::ShoppingNet => "shopping_net",
            Category::ShoppingPos => "shopping_pos",
            Category::Travel => "travel",
        }
    }

    /// Position within `ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for labels outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
