use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::{AdminStore, CatalogStore, Table};
use crate::admin::{CategoryDraft, ItemDraft};
use crate::catalog::{CatalogFilter, ItemQuery};
use crate::error::{Error, Result};
use crate::model::{
    AdminItem, Category, CategoryId, CategoryRef, Item, ItemId, Role, RoleRow, Status, UserId,
    UserProfile,
};

#[derive(Debug, Default)]
struct Tables {
    categories: Vec<Category>,
    items: Vec<Item>,
    users: Vec<UserProfile>,
}

/// In-process store with the same listing rules as the hosted tables.
///
/// Backs the offline CLI and tests that should not need a server.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(categories: Vec<Category>, items: Vec<Item>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                categories,
                items,
                users: Vec::new(),
            }),
        }
    }

    pub fn with_users(self, users: Vec<UserProfile>) -> Self {
        self.lock().users = users;
        self
    }

    /// The house menu: four categories and six dishes
    pub fn demo_menu() -> Self {
        let category = |id: &str, name: &str, description: &str| Category {
            id: CategoryId::from(id),
            name: name.to_string(),
            description: Some(description.to_string()),
            status: Status::Active,
            created_at: None,
        };
        let item = |id: &str,
                    name: &str,
                    description: &str,
                    cents: i64,
                    category: &str,
                    image: &str| Item {
            id: ItemId::from(id),
            name: name.to_string(),
            description: Some(description.to_string()),
            price: Decimal::new(cents, 2),
            category_id: CategoryId::from(category),
            status: Status::Active,
            image_url: Some(format!("/images/{}.jpg", image)),
            created_at: None,
        };

        Self::with_rows(
            vec![
                category("lanches", "Lanches", "Hambúrgueres e sanduíches"),
                category("pizzas", "Pizzas", "Pizzas tradicionais"),
                category("bebidas", "Bebidas", "Bebidas geladas"),
                category("acompanhamentos", "Acompanhamentos", "Porções para acompanhar"),
            ],
            vec![
                item(
                    "1",
                    "X-Burger Clássico",
                    "Hambúrguer suculento com queijo, alface, tomate e molho especial",
                    2590,
                    "lanches",
                    "burger",
                ),
                item(
                    "2",
                    "Pizza Margherita",
                    "Molho de tomate, mussarela, manjericão fresco e azeite",
                    4500,
                    "pizzas",
                    "pizza",
                ),
                item(
                    "3",
                    "Refrigerante Gelado",
                    "Coca-Cola, Guaraná ou Sprite - 350ml",
                    590,
                    "bebidas",
                    "drink",
                ),
                item(
                    "4",
                    "Batata Frita Grande",
                    "Porção generosa de batatas crocantes com sal especial",
                    1500,
                    "acompanhamentos",
                    "fries",
                ),
                item(
                    "5",
                    "X-Bacon",
                    "Hambúrguer com bacon crocante, queijo e cebola caramelizada",
                    2990,
                    "lanches",
                    "burger",
                ),
                item(
                    "6",
                    "Pizza Calabresa",
                    "Molho de tomate, mussarela, calabresa e cebola",
                    4800,
                    "pizzas",
                    "pizza",
                ),
            ],
        )
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let tables = self.lock();
        let mut categories: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| c.status == Status::Active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<Item>> {
        let filter = CatalogFilter::new(
            query.category_id.clone(),
            query.search.clone().unwrap_or_default(),
        );
        let tables = self.lock();
        let mut items: Vec<Item> = filter
            .apply(&tables.items)
            .into_iter()
            .filter(|item| item.is_active())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = items.len(), ?query, "listed items from memory");
        Ok(items)
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn list_all_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.lock().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_all_items(&self) -> Result<Vec<AdminItem>> {
        let tables = self.lock();
        let mut rows: Vec<AdminItem> = tables
            .items
            .iter()
            .map(|item| AdminItem {
                item: item.clone(),
                category: tables
                    .categories
                    .iter()
                    .find(|c| c.id == item.category_id)
                    .map(|c| CategoryRef {
                        name: c.name.clone(),
                    }),
            })
            .collect();
        rows.sort_by(|a, b| a.item.name.cmp(&b.item.name));
        Ok(rows)
    }

    async fn upsert_category(&self, id: Option<&CategoryId>, draft: &CategoryDraft) -> Result<()> {
        let mut tables = self.lock();
        match id {
            Some(id) => {
                let category = tables
                    .categories
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| Error::not_found(format!("category {}", id)))?;
                category.name = draft.name.clone();
                category.description = draft.description.clone();
            }
            None => tables.categories.push(Category {
                id: CategoryId::new(Uuid::new_v4().to_string()),
                name: draft.name.clone(),
                description: draft.description.clone(),
                status: Status::Active,
                created_at: Some(chrono::Utc::now()),
            }),
        }
        Ok(())
    }

    async fn upsert_item(&self, id: Option<&ItemId>, draft: &ItemDraft) -> Result<()> {
        let mut tables = self.lock();
        match id {
            Some(id) => {
                let item = tables
                    .items
                    .iter_mut()
                    .find(|i| &i.id == id)
                    .ok_or_else(|| Error::not_found(format!("item {}", id)))?;
                item.name = draft.name.clone();
                item.description = draft.description.clone();
                item.price = draft.price;
                item.category_id = draft.category_id.clone();
                item.image_url = draft.image_url.clone();
            }
            None => tables.items.push(Item {
                id: ItemId::new(Uuid::new_v4().to_string()),
                name: draft.name.clone(),
                description: draft.description.clone(),
                price: draft.price,
                category_id: draft.category_id.clone(),
                status: Status::Active,
                image_url: draft.image_url.clone(),
                created_at: Some(chrono::Utc::now()),
            }),
        }
        Ok(())
    }

    async fn soft_delete_category(&self, id: &CategoryId) -> Result<()> {
        let mut tables = self.lock();
        let category = tables
            .categories
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| Error::not_found(format!("category {}", id)))?;
        category.status = Status::Inactive;
        Ok(())
    }

    async fn soft_delete_item(&self, id: &ItemId) -> Result<()> {
        let mut tables = self.lock();
        let item = tables
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| Error::not_found(format!("item {}", id)))?;
        item.status = Status::Inactive;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let mut users = self.lock().users.clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn replace_roles(&self, user: &UserId, role: Role) -> Result<()> {
        let mut tables = self.lock();
        let profile = tables
            .users
            .iter_mut()
            .find(|u| &u.id == user)
            .ok_or_else(|| Error::not_found(format!("user {}", user)))?;
        profile.roles = vec![RoleRow { role }];
        Ok(())
    }

    async fn count(&self, table: Table) -> Result<u64> {
        let tables = self.lock();
        let count = match table {
            Table::Categories => tables.categories.len(),
            Table::Items => tables.items.len(),
            Table::Users => tables.users.len(),
        };
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_demo_menu_listing_is_sorted_by_name() {
        let store = MemoryStore::demo_menu();
        let items = store.list_items(&ItemQuery::default()).await.unwrap();
        assert_eq!(
            names(&items),
            vec![
                "Batata Frita Grande",
                "Pizza Calabresa",
                "Pizza Margherita",
                "Refrigerante Gelado",
                "X-Bacon",
                "X-Burger Clássico",
            ]
        );

        let categories = store.list_categories().await.unwrap();
        assert_eq!(categories.len(), 4);
        assert_eq!(categories[0].name, "Acompanhamentos");
    }

    #[tokio::test]
    async fn test_query_by_category_and_search() {
        let store = MemoryStore::demo_menu();
        let query = ItemQuery {
            category_id: Some("pizzas".into()),
            search: Some("CEBOLA".to_string()),
        };
        let items = store.list_items(&query).await.unwrap();
        assert_eq!(names(&items), vec!["Pizza Calabresa"]);
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_leave_the_storefront() {
        let store = MemoryStore::demo_menu();
        store.soft_delete_item(&ItemId::from("5")).await.unwrap();
        store
            .soft_delete_category(&CategoryId::from("bebidas"))
            .await
            .unwrap();

        let items = store.list_items(&ItemQuery::default()).await.unwrap();
        assert!(!names(&items).contains(&"X-Bacon"));
        assert_eq!(store.list_categories().await.unwrap().len(), 3);

        // still visible to the back-office
        assert_eq!(store.list_all_items().await.unwrap().len(), 6);
        assert_eq!(store.count(Table::Categories).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_upsert_item() {
        let store = MemoryStore::demo_menu();
        let draft = ItemDraft::from_form("Suco de Laranja", None, "8,50", "bebidas", None).unwrap();
        store.upsert_item(None, &draft).await.unwrap();
        assert_eq!(store.count(Table::Items).await.unwrap(), 7);

        let edit = ItemDraft::from_form("X-Bacon Duplo", None, "34.90", "lanches", None).unwrap();
        store
            .upsert_item(Some(&ItemId::from("5")), &edit)
            .await
            .unwrap();
        let rows = store.list_all_items().await.unwrap();
        let bacon = rows.iter().find(|r| r.item.id.as_str() == "5").unwrap();
        assert_eq!(bacon.item.name, "X-Bacon Duplo");
        assert_eq!(bacon.category.as_ref().map(|c| c.name.as_str()), Some("Lanches"));

        let missing = store.upsert_item(Some(&ItemId::from("nope")), &edit).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
