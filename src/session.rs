//! The storefront session
//!
//! One [`StorefrontSession`] per shopper, owned by whatever drives the UI and
//! handed to it by reference. It holds the fetched catalog, the filter, the
//! cart, and the notifications produced by cart operations.
//!
//! Fetches are issued outside the session: the caller takes a [`FetchTicket`],
//! runs `list_items(&ticket.query)` against a store, and hands the result back
//! through [`StorefrontSession::complete_fetch`]. A response for a filter the
//! shopper has since moved away from, or one that finishes after a newer fetch
//! was already applied, is dropped.

use tracing::{debug, error, info, warn};

use crate::admin::{customer_directory, AccessDecision, RoutePolicy};
use crate::cart::{Cart, Notice};
use crate::catalog::{CatalogFilter, ItemQuery};
use crate::error::Result;
use crate::model::{Category, CategoryId, CurrentUser, Item, ItemId, UserProfile};
use crate::store::{CatalogStore, IdentityProvider};

/// A fetch the session expects to be answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: ItemQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the catalog; carries the item count
    Applied(usize),
    /// The store failed; the catalog is now empty
    Failed,
    /// The response was discarded
    Stale,
}

#[derive(Debug, Default)]
pub struct StorefrontSession {
    categories: Vec<Category>,
    items: Vec<Item>,
    filter: CatalogFilter,
    cart: Cart,
    cart_open: bool,
    notices: Vec<Notice>,
    generation: u64,
    applied_generation: u64,
    viewer: Option<CurrentUser>,
    profile: Option<UserProfile>,
}

impl StorefrontSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Everything the last applied fetch returned
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The fetched collection narrowed by the current filter
    pub fn visible_items(&self) -> Vec<&Item> {
        self.filter.apply(&self.items)
    }

    pub fn select_category(&mut self, category: Option<CategoryId>) -> FetchTicket {
        self.filter.select_category(category);
        self.begin_fetch()
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> FetchTicket {
        self.filter.set_search(text);
        self.begin_fetch()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            query: self.filter.to_query(),
        }
    }

    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Item>>) -> FetchOutcome {
        if ticket.query != self.filter.to_query() || ticket.generation < self.applied_generation {
            warn!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale item fetch"
            );
            return FetchOutcome::Stale;
        }
        self.applied_generation = ticket.generation;

        match result {
            Ok(items) => {
                let count = items.len();
                debug!(generation = ticket.generation, count, "item fetch applied");
                self.items = items;
                FetchOutcome::Applied(count)
            }
            Err(err) => {
                error!(error = %err, "failed to fetch items");
                self.items.clear();
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch items for the current filter and apply the result
    pub async fn refresh(&mut self, store: &dyn CatalogStore) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let result = store.list_items(&ticket.query).await;
        self.complete_fetch(ticket, result)
    }

    /// Failures leave the category list empty
    pub async fn load_categories(&mut self, store: &dyn CatalogStore) -> usize {
        match store.list_categories().await {
            Ok(categories) => self.categories = categories,
            Err(err) => {
                error!(error = %err, "failed to fetch categories");
                self.categories.clear();
            }
        }
        self.categories.len()
    }

    /// Resolve the viewer and their own profile. A profile that fails to
    /// load is logged and left empty; the viewer error is returned.
    pub async fn load_viewer(&mut self, identity: &dyn IdentityProvider) -> Result<()> {
        self.viewer = identity.current_user().await?;
        self.profile = match self.viewer {
            Some(_) => match identity.current_profile().await {
                Ok(profile) => profile,
                Err(err) => {
                    error!(error = %err, "failed to fetch own profile");
                    None
                }
            },
            None => None,
        };
        Ok(())
    }

    pub fn set_viewer(&mut self, viewer: Option<CurrentUser>) {
        self.viewer = viewer;
    }

    pub fn viewer(&self) -> Option<&CurrentUser> {
        self.viewer.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Whether to show the back-office link. Display only.
    pub fn shows_admin_entry(&self) -> bool {
        RoutePolicy::back_office().evaluate(self.viewer()) == AccessDecision::Allow
    }

    /// Whether to show the customer directory. Display only.
    pub fn shows_customer_directory(&self) -> bool {
        customer_directory(self.profile()) == AccessDecision::Allow
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn add_item(&mut self, item: &Item) {
        let notice = self.cart.add_item(item);
        self.notices.push(notice);
    }

    /// Add an item from the visible list by id. Returns false when the id is
    /// not currently visible.
    pub fn add_visible_item(&mut self, item_id: &ItemId) -> bool {
        let Some(item) = self
            .visible_items()
            .into_iter()
            .find(|item| &item.id == item_id)
            .cloned()
        else {
            return false;
        };
        self.add_item(&item);
        true
    }

    pub fn update_quantity(&mut self, item_id: &ItemId, quantity: u32) {
        if let Some(notice) = self.cart.update_quantity(item_id, quantity) {
            self.notices.push(notice);
        }
    }

    pub fn remove_item(&mut self, item_id: &ItemId) {
        let notice = self.cart.remove_item(item_id);
        self.notices.push(notice);
    }

    pub fn checkout(&mut self) {
        let lines = self.cart.len();
        let total = self.cart.total();
        let notice = self.cart.checkout();
        self.cart_open = false;
        info!(lines, %total, "order placed");
        self.notices.push(notice);
    }

    pub fn open_cart(&mut self) {
        self.cart_open = true;
    }

    pub fn close_cart(&mut self) {
        self.cart_open = false;
    }

    pub fn is_cart_open(&self) -> bool {
        self.cart_open
    }

    /// Take every notification produced since the last call
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
