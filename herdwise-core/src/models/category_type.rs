use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule family a category type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Unweaned animals; weaning age is mandatory.
    Calf,
    /// Lactating females; milk fields apply.
    Dairy,
    General,
}

/// Reference to an animal category type. `code` is the stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryType {
    pub code: String,
    pub label: String,
    pub kind: CategoryKind,
}

const CATALOG: &[(&str, &str, CategoryKind)] = &[
    ("bezerro", "Bezerros (0-12 meses)", CategoryKind::Calf),
    ("bezerra", "Bezerras (0-12 meses)", CategoryKind::Calf),
    ("garrote", "Garrotes (12-24 meses)", CategoryKind::General),
    ("novilha", "Novilhas (12-24 meses)", CategoryKind::General),
    ("boi", "Bois (> 24 meses)", CategoryKind::General),
    ("touro", "Touros", CategoryKind::General),
    ("vaca-corte", "Vacas de corte", CategoryKind::General),
    ("vaca-leiteira", "Vacas em lactação", CategoryKind::Dairy),
    ("vaca-seca", "Vacas secas", CategoryKind::General),
];

impl CategoryType {
    pub fn new(code: impl Into<String>, label: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            kind,
        }
    }

    /// Built-in category types.
    pub fn catalog() -> Vec<CategoryType> {
        CATALOG
            .iter()
            .map(|(code, label, kind)| CategoryType::new(*code, *label, *kind))
            .collect()
    }

    pub fn lookup(code: &str) -> Option<CategoryType> {
        let code = code.to_lowercase();
        CATALOG
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(code, label, kind)| CategoryType::new(*code, *label, *kind))
    }

    pub fn is_calf(&self) -> bool {
        self.kind == CategoryKind::Calf
    }

    pub fn is_dairy(&self) -> bool {
        self.kind == CategoryKind::Dairy
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let calf = CategoryType::lookup("Bezerro").unwrap();
        assert!(calf.is_calf());
        assert!(!calf.is_dairy());
        assert!(CategoryType::lookup("cavalo").is_none());
    }

    #[test]
    fn test_catalog_codes_are_unique() {
        let catalog = CategoryType::catalog();
        let mut codes: Vec<&str> = catalog.iter().map(|t| t.code.as_str()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), catalog.len());
    }
}
