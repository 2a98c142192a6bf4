//! Data access
//!
//! The storefront core never talks HTTP directly. It depends on these
//! traits; [`SupabaseStore`] backs them with PostgREST and [`MemoryStore`]
//! keeps everything in process.

mod memory;
mod supabase;

use async_trait::async_trait;

use crate::admin::{CategoryDraft, ItemDraft};
use crate::catalog::ItemQuery;
use crate::error::Result;
use crate::model::{
    AdminItem, Category, CategoryId, CurrentUser, Item, ItemId, Role, UserId, UserProfile,
};

pub use memory::*;
pub use supabase::*;

/// Read side used by the storefront
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Active categories ordered by name
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Active items matching `query`, ordered by name
    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<Item>>;
}

/// Tables the back-office dashboard counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Categories,
    Items,
    Users,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Categories => "categorias",
            Table::Items => "itens",
            Table::Users => "usuarios",
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            Table::Categories => "id_categoria",
            Table::Items => "id_item",
            Table::Users => "id_usuario",
        }
    }
}

/// Write side used by the back-office. Deletion is always a soft delete.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Every category regardless of status, ordered by name
    async fn list_all_categories(&self) -> Result<Vec<Category>>;

    /// Every item regardless of status with its category name, ordered by name
    async fn list_all_items(&self) -> Result<Vec<AdminItem>>;

    /// Insert when `id` is `None`, otherwise update that row
    async fn upsert_category(&self, id: Option<&CategoryId>, draft: &CategoryDraft) -> Result<()>;

    async fn upsert_item(&self, id: Option<&ItemId>, draft: &ItemDraft) -> Result<()>;

    async fn soft_delete_category(&self, id: &CategoryId) -> Result<()>;

    async fn soft_delete_item(&self, id: &ItemId) -> Result<()>;

    /// Profiles with their role rows, ordered by name
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    /// Drop every role row of `user` and store `role` as the only one
    async fn replace_roles(&self, user: &UserId, role: Role) -> Result<()>;

    async fn count(&self, table: Table) -> Result<u64>;
}

/// Who is looking at the storefront
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<CurrentUser>>;

    /// The viewer's own `usuarios` row
    async fn current_profile(&self) -> Result<Option<UserProfile>>;
}

/// Fixed viewer, used by the offline CLI and tests
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    pub user: Option<CurrentUser>,
    pub profile: Option<UserProfile>,
}

impl StaticIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: CurrentUser, profile: Option<UserProfile>) -> Self {
        Self {
            user: Some(user),
            profile,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<CurrentUser>> {
        Ok(self.user.clone())
    }

    async fn current_profile(&self) -> Result<Option<UserProfile>> {
        Ok(self.profile.clone())
    }
}
