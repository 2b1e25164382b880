use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Commodity a record refers to.
///
/// The base metals are enumerated; contract descriptors that carry more than a
/// metal name (for example "MICRO GOLD") are kept verbatim, title-cased, in
/// [`Product::Other`] so they do not collide with the full-size contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    Gold,
    Silver,
    Copper,
    Aluminum,
    Platinum,
    Palladium,
    Other(String),
}

const BASE: [Product; 6] = [
    Product::Gold,
    Product::Silver,
    Product::Copper,
    Product::Aluminum,
    Product::Platinum,
    Product::Palladium,
];

impl Product {
    /// Display name, also the value stored in the database.
    pub fn as_str(&self) -> &str {
        match self {
            Product::Gold => "Gold",
            Product::Silver => "Silver",
            Product::Copper => "Copper",
            Product::Aluminum => "Aluminum",
            Product::Platinum => "Platinum",
            Product::Palladium => "Palladium",
            Product::Other(name) => name,
        }
    }

    /// Finds the base metal named in a file name such as
    /// `20260112_gold_stocks_Gold_Stocks.xls`.
    pub fn from_file_name(name: &str) -> Option<Product> {
        let lower = name.to_lowercase();
        // "aluminium" is how some exchange files spell it
        if lower.contains("aluminium") {
            return Some(Product::Aluminum);
        }
        BASE.iter()
            .find(|p| lower.contains(&p.as_str().to_lowercase()))
            .cloned()
    }

    /// Builds a product from the descriptor words of a contract announcement
    /// ("GOLD", "MICRO GOLD", "ALUMINUM").
    pub fn from_descriptor(descriptor: &str) -> Option<Product> {
        let words: Vec<&str> = descriptor.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        if let [single] = words.as_slice() {
            if let Ok(p) = single.parse::<Product>() {
                return Some(p);
            }
        }
        Some(Product::Other(title_case(&words)))
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("aluminium") {
            return Ok(Product::Aluminum);
        }
        BASE.iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(t))
            .cloned()
            .ok_or_else(|| format!("unknown product: {t}"))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(
            Product::from_file_name("20260112_gold_stocks_Gold_Stocks.xls"),
            Some(Product::Gold)
        );
        assert_eq!(
            Product::from_file_name("20260112_silver_stocks_Silver_stocks.xls"),
            Some(Product::Silver)
        );
        assert_eq!(
            Product::from_file_name("Aluminium_Stocks.xls"),
            Some(Product::Aluminum)
        );
        assert_eq!(Product::from_file_name("metal_delivery_daily.pdf"), None);
    }

    #[test]
    fn descriptors() {
        assert_eq!(Product::from_descriptor("GOLD"), Some(Product::Gold));
        assert_eq!(Product::from_descriptor("ALUMINUM"), Some(Product::Aluminum));
        assert_eq!(
            Product::from_descriptor("MICRO  GOLD"),
            Some(Product::Other("Micro Gold".into()))
        );
        assert_eq!(Product::from_descriptor("   "), None);
    }

    #[test]
    fn display_round_trips_base_metals() {
        for p in BASE {
            assert_eq!(p.to_string().parse::<Product>().unwrap(), p);
        }
        assert!("Lumber".parse::<Product>().is_err());
    }
}
