use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spending category shared by expenses and budgets.
///
/// The set is closed and its declaration order is the display order used by
/// every per-category summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(alias = "Makanan")]
    Food,
    #[serde(alias = "Transportasi")]
    Transportation,
    #[serde(alias = "Belanja")]
    Shopping,
    #[serde(alias = "Hiburan")]
    Entertainment,
    #[serde(alias = "Tagihan")]
    Bills,
    #[serde(alias = "Anak")]
    Children,
    #[serde(alias = "Lainnya")]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transportation,
        Category::Shopping,
        Category::Entertainment,
        Category::Bills,
        Category::Children,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Children => "Children",
            Category::Other => "Other",
        }
    }

    /// Label used by sheets written before the categories were renamed.
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Category::Food => "Makanan",
            Category::Transportation => "Transportasi",
            Category::Shopping => "Belanja",
            Category::Entertainment => "Hiburan",
            Category::Bills => "Tagihan",
            Category::Children => "Anak",
            Category::Other => "Lainnya",
        }
    }

    /// Position in the fixed category order.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(trimmed)
                    || c.legacy_label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_english_names() {
        assert_eq!("Food".parse::<Category>(), Ok(Category::Food));
        assert_eq!("bills".parse::<Category>(), Ok(Category::Bills));
        assert_eq!(" OTHER ".parse::<Category>(), Ok(Category::Other));
    }

    #[test]
    fn test_parse_legacy_labels() {
        assert_eq!("Makanan".parse::<Category>(), Ok(Category::Food));
        assert_eq!("transportasi".parse::<Category>(), Ok(Category::Transportation));
        assert_eq!("Anak".parse::<Category>(), Ok(Category::Children));
    }

    #[test]
    fn test_parse_unknown() {
        assert!("Groceries".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let err = " Groceries ".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("Groceries".to_string()));
        assert_eq!(err.to_string(), "unknown category: Groceries");

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_order_matches_index() {
        for (i, cat) in Category::ALL.iter().enumerate() {
            assert_eq!(cat.index(), i);
        }
    }

    #[test]
    fn test_serde_accepts_legacy_alias() {
        let cat: Category = serde_json::from_str("\"Hiburan\"").unwrap();
        assert_eq!(cat, Category::Entertainment);
        assert_eq!(serde_json::to_string(&cat).unwrap(), "\"Entertainment\"");
    }
}
