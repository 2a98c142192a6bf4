//! Shopping cart
//!
//! Lines are kept in insertion order and keyed by item id. Each line is a
//! snapshot of the item taken when it was first added: later price or name
//! changes in the catalog do not touch lines already in the cart.
//!
//! Subtotals and totals saturate at `Decimal::MAX` instead of overflowing.

use rust_decimal::Decimal;
use std::fmt;

use crate::model::{Item, ItemId};

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item_id: ItemId,
    pub name: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    /// Always >= 1 while the line exists
    pub quantity: u32,
}

impl CartLine {
    fn snapshot(item: &Item) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            image_url: item.image_url.clone(),
            quantity: 1,
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }
}

/// User-visible confirmation produced by a cart operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Added { name: String },
    AddedAgain { name: String },
    Removed,
    OrderPlaced,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Added { name } => write!(f, "{} added to cart!", name),
            Notice::AddedAgain { name } => write!(f, "{} added again!", name),
            Notice::Removed => f.write_str("Item removed from cart"),
            Notice::OrderPlaced => f.write_str("Order placed successfully!"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, item_id: &ItemId) -> Option<usize> {
        self.lines.iter().position(|line| &line.item_id == item_id)
    }

    /// Add one unit of `item`
    pub fn add_item(&mut self, item: &Item) -> Notice {
        match self.position(&item.id) {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = line.quantity.saturating_add(1);
                Notice::AddedAgain {
                    name: item.name.clone(),
                }
            }
            None => {
                self.lines.push(CartLine::snapshot(item));
                Notice::Added {
                    name: item.name.clone(),
                }
            }
        }
    }

    /// Set a line's quantity. Zero removes the line exactly like
    /// [`Cart::remove_item`]; an unknown id is a no-op.
    pub fn update_quantity(&mut self, item_id: &ItemId, quantity: u32) -> Option<Notice> {
        if quantity == 0 {
            return Some(self.remove_item(item_id));
        }
        let index = self.position(item_id)?;
        self.lines[index].quantity = quantity;
        None
    }

    /// Drop the line for `item_id` if there is one
    pub fn remove_item(&mut self, item_id: &ItemId) -> Notice {
        self.lines.retain(|line| &line.item_id != item_id);
        Notice::Removed
    }

    /// Place the order. Nothing is submitted anywhere: the cart is emptied
    /// and the confirmation returned.
    pub fn checkout(&mut self) -> Notice {
        self.lines.clear();
        Notice::OrderPlaced
    }

    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(CartLine::subtotal)
            .fold(Decimal::ZERO, |total, subtotal| {
                total.checked_add(subtotal).unwrap_or(Decimal::MAX)
            })
    }

    /// Sum of quantities, shown on the cart badge
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.item_id == item_id)
    }

    /// Number of distinct lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryId, Status};

    fn item(id: &str, name: &str, cents: i64) -> Item {
        Item {
            id: ItemId::from(id),
            name: name.to_string(),
            description: None,
            price: Decimal::new(cents, 2),
            category_id: CategoryId::from("lanches"),
            status: Status::Active,
            image_url: Some(format!("/img/{}.jpg", id)),
            created_at: None,
        }
    }

    #[test]
    fn empty_cart() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn adding_twice_increments_one_line() {
        let mut cart = Cart::new();
        let burger = item("a", "X-Burger", 2590);

        assert_eq!(
            cart.add_item(&burger),
            Notice::Added {
                name: "X-Burger".to_string()
            }
        );
        assert_eq!(
            cart.add_item(&burger),
            Notice::AddedAgain {
                name: "X-Burger".to_string()
            }
        );

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&burger.id).map(|l| l.quantity), Some(2));
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add_item(&item("b", "Pizza", 4500));
        cart.add_item(&item("a", "Burger", 2590));
        cart.add_item(&item("b", "Pizza", 4500));

        let order: Vec<&str> = cart.lines().iter().map(|l| l.item_id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn lines_are_snapshots() {
        let mut cart = Cart::new();
        let mut burger = item("a", "X-Burger", 2590);
        cart.add_item(&burger);

        burger.price = Decimal::new(9990, 2);
        burger.name = "X-Burger Deluxe".to_string();
        cart.add_item(&burger);

        let line = cart.line(&burger.id).unwrap();
        assert_eq!(line.unit_price, Decimal::new(2590, 2));
        assert_eq!(line.name, "X-Burger");
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn update_quantity_sets_directly() {
        let mut cart = Cart::new();
        let burger = item("a", "X-Burger", 2590);
        cart.add_item(&burger);

        assert_eq!(cart.update_quantity(&burger.id, 5), None);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.update_quantity(&burger.id, 4), None);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn update_quantity_zero_is_remove() {
        let burger = item("a", "X-Burger", 2590);
        let soda = item("b", "Refrigerante", 590);

        let mut via_update = Cart::new();
        via_update.add_item(&burger);
        via_update.add_item(&soda);
        let mut via_remove = via_update.clone();

        let notice = via_update.update_quantity(&burger.id, 0);
        let expected = via_remove.remove_item(&burger.id);

        assert_eq!(notice, Some(expected));
        assert_eq!(via_update, via_remove);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(&item("a", "X-Burger", 2590));
        let before = cart.clone();

        assert_eq!(cart.update_quantity(&ItemId::from("zzz"), 3), None);
        assert_eq!(cart, before);
    }

    #[test]
    fn remove_unknown_id_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(&item("a", "X-Burger", 2590));
        let before = cart.clone();

        assert_eq!(cart.remove_item(&ItemId::from("zzz")), Notice::Removed);
        assert_eq!(cart, before);
    }

    #[test]
    fn quantity_saturates() {
        let mut cart = Cart::new();
        let burger = item("a", "X-Burger", 100);
        cart.add_item(&burger);
        cart.update_quantity(&burger.id, u32::MAX);
        cart.add_item(&burger);
        assert_eq!(cart.line(&burger.id).map(|l| l.quantity), Some(u32::MAX));
    }

    #[test]
    fn totals_worked_example() {
        let mut cart = Cart::new();
        let a = item("a", "X-Burger Clássico", 2590);
        let b = item("b", "Refrigerante Gelado", 590);
        cart.add_item(&a);
        cart.add_item(&a);
        cart.add_item(&b);

        assert_eq!(cart.total(), Decimal::new(5770, 2));
        assert_eq!(cart.item_count(), 3);

        cart.remove_item(&a.id);
        assert_eq!(cart.total(), Decimal::new(590, 2));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let mut cart = Cart::new();
        let mut expensive = item("a", "Banquete", 0);
        expensive.price = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        cart.add_item(&expensive);
        cart.update_quantity(&expensive.id, u32::MAX);

        assert_eq!(cart.line(&expensive.id).map(CartLine::subtotal), Some(Decimal::MAX));
        assert_eq!(cart.total(), Decimal::MAX);

        let mut max_priced = item("b", "Outro", 0);
        max_priced.price = Decimal::MAX;
        cart.add_item(&max_priced);
        assert_eq!(cart.total(), Decimal::MAX);
        assert_eq!(cart.item_count(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn checkout_empties_cart() {
        let mut cart = Cart::new();
        cart.add_item(&item("a", "X-Burger", 2590));
        cart.add_item(&item("b", "Pizza", 4500));

        assert_eq!(cart.checkout(), Notice::OrderPlaced);
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);

        assert_eq!(Cart::new().checkout(), Notice::OrderPlaced);
    }

    #[test]
    fn notice_text() {
        let added = Notice::Added {
            name: "Pizza Margherita".to_string(),
        };
        assert_eq!(added.to_string(), "Pizza Margherita added to cart!");
        assert_eq!(Notice::Removed.to_string(), "Item removed from cart");
    }
}
