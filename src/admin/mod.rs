//! Back-office: category, item and user management

mod access;
mod draft;

pub use access::*;
pub use draft::*;

use tracing::info;

use crate::error::Result;
use crate::model::{AdminItem, Category, CategoryId, ItemId, Role, UserId, UserProfile};
use crate::store::{AdminStore, Table};

/// A profile with the role the user management screen shows for it
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub profile: UserProfile,
    /// First role row, or customer when there is none
    pub current_role: Role,
}

impl From<UserProfile> for UserSummary {
    fn from(profile: UserProfile) -> Self {
        let current_role = profile
            .roles
            .first()
            .map(|row| row.role)
            .unwrap_or_default();
        Self {
            profile,
            current_role,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub categories: u64,
    pub items: u64,
    pub users: u64,
}

pub struct AdminService<S> {
    store: S,
}

impl<S: AdminStore> AdminService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.store.list_all_categories().await
    }

    /// Create when `id` is `None`, otherwise edit
    pub async fn save_category(&self, id: Option<&CategoryId>, draft: &CategoryDraft) -> Result<()> {
        draft.validate()?;
        self.store.upsert_category(id, draft).await?;
        info!(name = %draft.name, editing = id.is_some(), "category saved");
        Ok(())
    }

    pub async fn deactivate_category(&self, id: &CategoryId) -> Result<()> {
        self.store.soft_delete_category(id).await?;
        info!(category_id = %id, "category deactivated");
        Ok(())
    }

    pub async fn items(&self) -> Result<Vec<AdminItem>> {
        self.store.list_all_items().await
    }

    pub async fn save_item(&self, id: Option<&ItemId>, draft: &ItemDraft) -> Result<()> {
        draft.validate()?;
        self.store.upsert_item(id, draft).await?;
        info!(name = %draft.name, price = %draft.price, editing = id.is_some(), "item saved");
        Ok(())
    }

    pub async fn deactivate_item(&self, id: &ItemId) -> Result<()> {
        self.store.soft_delete_item(id).await?;
        info!(item_id = %id, "item deactivated");
        Ok(())
    }

    pub async fn users(&self) -> Result<Vec<UserSummary>> {
        let profiles = self.store.list_users().await?;
        Ok(profiles.into_iter().map(UserSummary::from).collect())
    }

    /// Make `role` the user's only role
    pub async fn assign_role(&self, user: &UserId, role: Role) -> Result<()> {
        self.store.replace_roles(user, role).await?;
        info!(user_id = %user, %role, "role assigned");
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<DashboardCounts> {
        let (categories, items, users) = tokio::try_join!(
            self.store.count(Table::Categories),
            self.store.count(Table::Items),
            self.store.count(Table::Users),
        )?;
        Ok(DashboardCounts {
            categories,
            items,
            users,
        })
    }
}
