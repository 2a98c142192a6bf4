//! PostgREST-backed stores

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use storefront_auth::AuthClient;
use storefront_postgrest::{escape_like, quote_filter_value, PostgrestClient, SortOrder};
use tracing::{debug, info};

use super::{AdminStore, CatalogStore, IdentityProvider, Table};
use crate::admin::{CategoryDraft, ItemDraft};
use crate::catalog::ItemQuery;
use crate::error::{Error, Result};
use crate::model::{
    AdminItem, Category, CategoryId, CurrentUser, Item, ItemId, Role, Status, UserId, UserProfile,
};

const CATEGORIES: &str = "categorias";
const ITEMS: &str = "itens";
const USERS: &str = "usuarios";
const USER_ROLES: &str = "user_roles";
const PROFILE_COLUMNS: &str = "id_usuario,nome,email,papel,telefone,data_cadastro,status";

/// An update answered with `[]` matched no row
fn ensure_matched(rows: &Value, what: impl fmt::Display) -> Result<()> {
    match rows.as_array() {
        Some(rows) if rows.is_empty() => Err(Error::not_found(what)),
        _ => Ok(()),
    }
}

/// Catalog and back-office tables on a Supabase project.
///
/// When an [`AuthClient`] is attached, requests carry the signed-in user's
/// token so row-level policies apply to that user instead of the anon role.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    url: String,
    anon_key: String,
    schema: String,
    http_client: Client,
    auth: Option<AuthClient>,
}

impl SupabaseStore {
    pub fn new(url: &str, anon_key: &str, http_client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            schema: "public".to_string(),
            http_client,
            auth: None,
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn with_auth(mut self, auth: AuthClient) -> Self {
        self.auth = Some(auth);
        self
    }

    fn from(&self, table: &str) -> Result<PostgrestClient> {
        let mut client =
            PostgrestClient::new(&self.url, &self.anon_key, table, self.http_client.clone());
        if self.schema != "public" {
            client = client.schema(&self.schema)?;
        }
        if let Some(token) = self.auth.as_ref().and_then(AuthClient::access_token) {
            client = client.with_auth(&token)?;
        }
        Ok(client)
    }
}

#[async_trait]
impl CatalogStore for SupabaseStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = self
            .from(CATEGORIES)?
            .select("*")
            .eq("status", Status::Active.as_str())
            .order("nome_categoria", SortOrder::Ascending)
            .execute::<Category>()
            .await?;
        debug!(count = categories.len(), "fetched categories");
        Ok(categories)
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<Item>> {
        let mut request = self
            .from(ITEMS)?
            .select("*")
            .eq("status", Status::Active.as_str());

        if let Some(category) = &query.category_id {
            request = request.eq("id_categoria", category.as_str());
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = quote_filter_value(&format!("*{}*", escape_like(search)));
            request = request.or(&format!(
                "nome_item.ilike.{p},descricao_item.ilike.{p}",
                p = pattern
            ));
        }

        let items = request
            .order("nome_item", SortOrder::Ascending)
            .execute::<Item>()
            .await?;
        debug!(count = items.len(), ?query, "fetched items");
        Ok(items)
    }
}

#[async_trait]
impl AdminStore for SupabaseStore {
    async fn list_all_categories(&self) -> Result<Vec<Category>> {
        Ok(self
            .from(CATEGORIES)?
            .select("*")
            .order("nome_categoria", SortOrder::Ascending)
            .execute::<Category>()
            .await?)
    }

    async fn list_all_items(&self) -> Result<Vec<AdminItem>> {
        Ok(self
            .from(ITEMS)?
            .select("*,categorias(nome_categoria)")
            .order("nome_item", SortOrder::Ascending)
            .execute::<AdminItem>()
            .await?)
    }

    async fn upsert_category(&self, id: Option<&CategoryId>, draft: &CategoryDraft) -> Result<()> {
        match id {
            Some(id) => {
                let rows = self
                    .from(CATEGORIES)?
                    .eq("id_categoria", id.as_str())
                    .update(draft)
                    .await?;
                ensure_matched(&rows, format!("category {}", id))?;
                info!(category_id = %id, "category updated");
            }
            None => {
                self.from(CATEGORIES)?.insert(draft).await?;
                info!(name = %draft.name, "category created");
            }
        }
        Ok(())
    }

    async fn upsert_item(&self, id: Option<&ItemId>, draft: &ItemDraft) -> Result<()> {
        match id {
            Some(id) => {
                let rows = self
                    .from(ITEMS)?
                    .eq("id_item", id.as_str())
                    .update(draft)
                    .await?;
                ensure_matched(&rows, format!("item {}", id))?;
                info!(item_id = %id, "item updated");
            }
            None => {
                self.from(ITEMS)?.insert(draft).await?;
                info!(name = %draft.name, "item created");
            }
        }
        Ok(())
    }

    async fn soft_delete_category(&self, id: &CategoryId) -> Result<()> {
        let rows = self
            .from(CATEGORIES)?
            .eq("id_categoria", id.as_str())
            .update(json!({ "status": Status::Inactive }))
            .await?;
        ensure_matched(&rows, format!("category {}", id))?;
        info!(category_id = %id, "category deactivated");
        Ok(())
    }

    async fn soft_delete_item(&self, id: &ItemId) -> Result<()> {
        let rows = self
            .from(ITEMS)?
            .eq("id_item", id.as_str())
            .update(json!({ "status": Status::Inactive }))
            .await?;
        ensure_matched(&rows, format!("item {}", id))?;
        info!(item_id = %id, "item deactivated");
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self
            .from(USERS)?
            .select("*,user_roles(role)")
            .order("nome", SortOrder::Ascending)
            .execute::<UserProfile>()
            .await?)
    }

    async fn replace_roles(&self, user: &UserId, role: Role) -> Result<()> {
        self.from(USER_ROLES)?
            .eq("user_id", user.as_str())
            .delete()
            .await?;
        self.from(USER_ROLES)?
            .insert(json!({ "user_id": user, "role": role }))
            .await?;
        info!(user_id = %user, %role, "role replaced");
        Ok(())
    }

    async fn count(&self, table: Table) -> Result<u64> {
        Ok(self
            .from(table.name())?
            .select(table.id_column())
            .count()
            .await?)
    }
}

#[derive(Deserialize)]
struct RoleOnly {
    role: Role,
}

/// Viewer resolved from the auth session plus its `user_roles` rows
#[derive(Debug, Clone)]
pub struct SupabaseIdentity {
    auth: AuthClient,
    store: SupabaseStore,
}

impl SupabaseIdentity {
    pub fn new(auth: AuthClient, store: SupabaseStore) -> Self {
        let store = store.with_auth(auth.clone());
        Self { auth, store }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn current_user(&self) -> Result<Option<CurrentUser>> {
        let Some(user_id) = self.auth.current_user_id() else {
            return Ok(None);
        };

        let rows = self
            .store
            .from(USER_ROLES)?
            .select("role")
            .eq("user_id", &user_id)
            .execute::<RoleOnly>()
            .await?;

        Ok(Some(CurrentUser {
            id: UserId::from(user_id),
            roles: rows.into_iter().map(|row| row.role).collect(),
        }))
    }

    async fn current_profile(&self) -> Result<Option<UserProfile>> {
        let Some(user_id) = self.auth.current_user_id() else {
            return Ok(None);
        };

        let profile = self
            .store
            .from(USERS)?
            .select(PROFILE_COLUMNS)
            .eq("id_usuario", &user_id)
            .limit(1)
            .execute::<UserProfile>()
            .await?
            .into_iter()
            .next();
        debug!(user_id = %user_id, found = profile.is_some(), "loaded own profile");
        Ok(profile)
    }
}
