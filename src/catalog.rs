//! Catalog filtering
//!
//! The storefront narrows the menu by an optional category and a free-text
//! search. The same filter drives two things: the query sent to the store
//! ([`ItemQuery`]) and the local re-derivation of the visible list from
//! whatever collection was fetched last.

use crate::model::{CategoryId, Item};

/// What to ask the store for. Only active items are ever listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
}

/// Selected category plus search text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    category: Option<CategoryId>,
    search: String,
}

impl CatalogFilter {
    pub fn new(category: Option<CategoryId>, search: impl Into<String>) -> Self {
        Self {
            category,
            search: search.into(),
        }
    }

    pub fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// `None` means "all categories"
    pub fn select_category(&mut self, category: Option<CategoryId>) {
        self.category = category;
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.search.is_empty()
    }

    /// Category predicate AND search predicate
    pub fn matches(&self, item: &Item) -> bool {
        self.matches_category(item) && self.matches_search(item)
    }

    fn matches_category(&self, item: &Item) -> bool {
        match &self.category {
            Some(category) => &item.category_id == category,
            None => true,
        }
    }

    fn matches_search(&self, item: &Item) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        item.name.to_lowercase().contains(&needle)
            || item
                .description
                .as_deref()
                .map_or(false, |d| d.to_lowercase().contains(&needle))
    }

    /// Visible subset, in source order
    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|item| self.matches(item)).collect()
    }

    pub fn to_query(&self) -> ItemQuery {
        ItemQuery {
            category_id: self.category.clone(),
            search: if self.search.is_empty() {
                None
            } else {
                Some(self.search.clone())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemId, Status};
    use rust_decimal::Decimal;

    fn item(id: &str, name: &str, description: Option<&str>, category: &str) -> Item {
        Item {
            id: ItemId::from(id),
            name: name.to_string(),
            description: description.map(str::to_string),
            price: Decimal::new(1000, 2),
            category_id: CategoryId::from(category),
            status: Status::Active,
            image_url: None,
            created_at: None,
        }
    }

    fn menu() -> Vec<Item> {
        vec![
            item(
                "1",
                "X-Burger Clássico",
                Some("Hambúrguer com queijo e molho especial"),
                "lanches",
            ),
            item(
                "2",
                "Pizza Margherita",
                Some("Mussarela e manjericão fresco"),
                "pizzas",
            ),
            item(
                "3",
                "Refrigerante Gelado",
                Some("Coca-Cola, Guaraná ou Sprite"),
                "bebidas",
            ),
            item(
                "5",
                "X-Bacon",
                Some("Hambúrguer com bacon crocante e queijo"),
                "lanches",
            ),
            item("7", "Água", None, "bebidas"),
        ]
    }

    fn ids(items: Vec<&Item>) -> Vec<&str> {
        items.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn empty_filter_shows_everything_in_order() {
        let items = menu();
        let filter = CatalogFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(filter.apply(&items)), vec!["1", "2", "3", "5", "7"]);
    }

    #[test]
    fn category_only() {
        let items = menu();
        let filter = CatalogFilter::new(Some("lanches".into()), "");
        assert_eq!(ids(filter.apply(&items)), vec!["1", "5"]);
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let items = menu();
        assert_eq!(ids(CatalogFilter::new(None, "PIZZA").apply(&items)), vec!["2"]);
        assert_eq!(ids(CatalogFilter::new(None, "queijo").apply(&items)), vec!["1", "5"]);
        assert_eq!(ids(CatalogFilter::new(None, "guaraná").apply(&items)), vec!["3"]);
    }

    #[test]
    fn missing_description_only_matches_on_name() {
        let items = menu();
        assert_eq!(ids(CatalogFilter::new(None, "água").apply(&items)), vec!["7"]);
        assert!(CatalogFilter::new(None, "mineral").apply(&items).is_empty());
    }

    #[test]
    fn both_predicates_must_hold() {
        let items = menu();
        let filter = CatalogFilter::new(Some("lanches".into()), "bacon");
        assert_eq!(ids(filter.apply(&items)), vec!["5"]);

        let filter = CatalogFilter::new(Some("bebidas".into()), "bacon");
        assert!(filter.apply(&items).is_empty());
    }

    #[test]
    fn unknown_category_yields_empty_result() {
        let items = menu();
        let filter = CatalogFilter::new(Some("sobremesas".into()), "");
        assert!(filter.apply(&items).is_empty());
    }

    #[test]
    fn filter_agrees_with_brute_force_predicate() {
        let items = menu();
        let categories = [None, Some("lanches"), Some("bebidas"), Some("nada")];
        let searches = ["", "x-", "QUEIJO", "a", "zzz"];

        for category in categories {
            for search in searches {
                let filter = CatalogFilter::new(category.map(CategoryId::from), search);
                let expected: Vec<&str> = items
                    .iter()
                    .filter(|i| category.map_or(true, |c| i.category_id.as_str() == c))
                    .filter(|i| {
                        let s = search.to_lowercase();
                        i.name.to_lowercase().contains(&s)
                            || i.description.clone().unwrap_or_default().to_lowercase().contains(&s)
                                && i.description.is_some()
                    })
                    .map(|i| i.id.as_str())
                    .collect();
                assert_eq!(ids(filter.apply(&items)), expected, "{:?} {:?}", category, search);
            }
        }
    }

    #[test]
    fn to_query() {
        let mut filter = CatalogFilter::default();
        assert_eq!(filter.to_query(), ItemQuery::default());

        filter.select_category(Some("pizzas".into()));
        filter.set_search("calabresa");
        assert_eq!(
            filter.to_query(),
            ItemQuery {
                category_id: Some("pizzas".into()),
                search: Some("calabresa".to_string()),
            }
        );
    }
}
