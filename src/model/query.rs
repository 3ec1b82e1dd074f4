//! Search and listing query parameters understood by the wallpaper site.
//!
//! Categories and purities are three-digit bit masks (`100` = first option,
//! `010` = second, `001` = third); combining options ORs the masks together.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ModelError;

fn mask_to_string(mask: u8) -> String {
    format!("{:03b}", mask & 0b111)
}

/// Content category filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    General,
    Anime,
    People,
}

impl Category {
    fn mask(self) -> u8 {
        match self {
            Self::General => 0b100,
            Self::Anime => 0b010,
            Self::People => 0b001,
        }
    }

    /// Combine several categories into one mask string, e.g. `"110"`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySelection`] if `categories` is empty.
    pub fn combine(categories: &[Category]) -> Result<String, ModelError> {
        if categories.is_empty() {
            return Err(ModelError::EmptySelection("categories"));
        }
        let mask = categories.iter().fold(0, |acc, c| acc | c.mask());
        Ok(mask_to_string(mask))
    }

    /// `categories=...` query fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySelection`] if `categories` is empty.
    pub fn as_query(categories: &[Category]) -> Result<String, ModelError> {
        Ok(format!("categories={}", Self::combine(categories)?))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_to_string(self.mask()))
    }
}

/// Content purity filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purity {
    Sfw,
    Sketchy,
}

impl Purity {
    fn mask(self) -> u8 {
        match self {
            Self::Sfw => 0b100,
            Self::Sketchy => 0b010,
        }
    }

    /// Combine several purities into one mask string.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySelection`] if `purities` is empty.
    pub fn combine(purities: &[Purity]) -> Result<String, ModelError> {
        if purities.is_empty() {
            return Err(ModelError::EmptySelection("purity"));
        }
        let mask = purities.iter().fold(0, |acc, p| acc | p.mask());
        Ok(mask_to_string(mask))
    }

    /// `purity=...` query fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySelection`] if `purities` is empty.
    pub fn as_query(purities: &[Purity]) -> Result<String, ModelError> {
        Ok(format!("purity={}", Self::combine(purities)?))
    }
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_to_string(self.mask()))
    }
}

/// Result ordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sorting {
    Toplist,
    Random,
    Relevance,
    DateAdded,
    Views,
    Favorites,
}

impl Sorting {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toplist => "toplist",
            Self::Random => "random",
            Self::Relevance => "relevance",
            Self::DateAdded => "date_added",
            Self::Views => "views",
            Self::Favorites => "favorites",
        }
    }

    #[must_use]
    pub fn as_query(self) -> String {
        format!("sorting={}", self.as_str())
    }
}

/// Time window for toplist sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopRange {
    LastDay,
    LastThreeDays,
    LastWeek,
    LastMonth,
    LastThreeMonths,
    LastSixMonths,
    LastYear,
}

impl TopRange {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastDay => "1d",
            Self::LastThreeDays => "3d",
            Self::LastWeek => "1w",
            Self::LastMonth => "1M",
            Self::LastThreeMonths => "3M",
            Self::LastSixMonths => "6M",
            Self::LastYear => "1y",
        }
    }

    #[must_use]
    pub fn as_query(self) -> String {
        format!("topRange={}", self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Order {
    #[default]
    Desc,
    Asc,
}

impl Order {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desc => "desc",
            Self::Asc => "asc",
        }
    }

    #[must_use]
    pub fn as_query(self) -> String {
        format!("order={}", self.as_str())
    }
}

/// A complete set of listing filters.
///
/// Empty category or purity lists leave the site defaults in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search terms
    pub text: Option<String>,
    pub categories: Vec<Category>,
    pub purity: Vec<Purity>,
    pub sorting: Option<Sorting>,
    pub top_range: Option<TopRange>,
    pub order: Option<Order>,
}

impl SearchQuery {
    /// Query with only a sorting strategy set.
    #[must_use]
    pub fn sorted(sorting: Sorting) -> Self {
        Self {
            sorting: Some(sorting),
            ..Default::default()
        }
    }

    /// Free-text query.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Query string parameters as `(name, value)` pairs, in a stable order.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref text) = self.text {
            params.push(("q", text.clone()));
        }
        if let Ok(mask) = Category::combine(&self.categories) {
            params.push(("categories", mask));
        }
        if let Ok(mask) = Purity::combine(&self.purity) {
            params.push(("purity", mask));
        }
        if let Some(sorting) = self.sorting {
            params.push(("sorting", sorting.as_str().to_string()));
        }
        if let Some(range) = self.top_range {
            params.push(("topRange", range.as_str().to_string()));
        }
        if let Some(order) = self.order {
            params.push(("order", order.as_str().to_string()));
        }
        params
    }
}
