//! Back-office form payloads
//!
//! Drafts are what an administrator submits when creating or editing a row.
//! They serialize straight into the table's columns.

use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::CategoryId;

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDraft {
    #[serde(rename = "nome_categoria")]
    pub name: String,
    #[serde(rename = "descricao_categoria")]
    pub description: Option<String>,
}

impl CategoryDraft {
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            name: name.trim().to_string(),
            description: non_blank(description),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("category name is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDraft {
    #[serde(rename = "nome_item")]
    pub name: String,
    #[serde(rename = "descricao_item")]
    pub description: Option<String>,
    #[serde(rename = "preco")]
    pub price: Decimal,
    #[serde(rename = "id_categoria")]
    pub category_id: CategoryId,
    #[serde(rename = "imagem_url")]
    pub image_url: Option<String>,
}

impl ItemDraft {
    /// Build a draft from raw form fields; blank optional fields become null.
    pub fn from_form(
        name: &str,
        description: Option<&str>,
        price: &str,
        category_id: &str,
        image_url: Option<&str>,
    ) -> Result<Self> {
        let draft = Self {
            name: name.trim().to_string(),
            description: non_blank(description),
            price: Self::parse_price(price)?,
            category_id: CategoryId::from(category_id.trim()),
            image_url: non_blank(image_url),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Accepts `25.90` as well as `25,90`
    pub fn parse_price(text: &str) -> Result<Decimal> {
        let normalized = text.trim().replace(',', ".");
        Decimal::from_str(&normalized)
            .map_err(|_| Error::invalid_input(format!("invalid price: {:?}", text)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("item name is required"));
        }
        if self.price < Decimal::ZERO {
            return Err(Error::invalid_input("price cannot be negative"));
        }
        if self.category_id.as_str().trim().is_empty() {
            return Err(Error::invalid_input("item category is required"));
        }
        Ok(())
    }
}
