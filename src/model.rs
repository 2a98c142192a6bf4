//! Rows of the storefront tables
//!
//! Field names are English; the serde renames carry the column names of the
//! hosted schema (`categorias`, `itens`, `usuarios`, `user_roles`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a menu item (`itens.id_item`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// Identifier of a category (`categorias.id_categoria`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

/// Identifier of an auth user (`usuarios.id_usuario`, `user_roles.user_id`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

macro_rules! impl_string_id {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(id: &str) -> Self {
                    Self(id.to_string())
                }
            }

            impl From<String> for $name {
                fn from(id: String) -> Self {
                    Self(id)
                }
            }
        )*
    };
}

impl_string_id!(ItemId, CategoryId, UserId);

/// Soft-delete flag shared by every table (`status_tipo`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "ativo",
            Status::Inactive => "inativo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "id_categoria")]
    pub id: CategoryId,
    #[serde(rename = "nome_categoria")]
    pub name: String,
    #[serde(rename = "descricao_categoria", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A sellable menu entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "id_item")]
    pub id: ItemId,
    #[serde(rename = "nome_item")]
    pub name: String,
    #[serde(rename = "descricao_item", default)]
    pub description: Option<String>,
    #[serde(rename = "preco")]
    pub price: Decimal,
    #[serde(rename = "id_categoria")]
    pub category_id: CategoryId,
    #[serde(default)]
    pub status: Status,
    #[serde(rename = "imagem_url", default)]
    pub image_url: Option<String>,
    #[serde(rename = "data_cadastro", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// Name of the category embedded by `select=*,categorias(nome_categoria)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(rename = "nome_categoria")]
    pub name: String,
}

/// Item row as the back-office lists it, with its category name joined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminItem {
    #[serde(flatten)]
    pub item: Item,
    #[serde(rename = "categorias", default)]
    pub category: Option<CategoryRef>,
}

/// Application role stored in `user_roles.role`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "gerente")]
    Manager,
    #[serde(rename = "funcionario")]
    Staff,
    #[default]
    #[serde(rename = "cliente")]
    Customer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Staff, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "gerente",
            Role::Staff => "funcionario",
            Role::Customer => "cliente",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRow {
    pub role: Role,
}

/// Profile kind kept on the `usuarios` row itself (`papel_usuario`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    #[serde(rename = "admin")]
    Admin,
    #[default]
    #[serde(rename = "usuario")]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "id_usuario")]
    pub id: UserId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "papel", default)]
    pub kind: ProfileKind,
    #[serde(default)]
    pub status: Status,
    #[serde(rename = "data_cadastro", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "user_roles", default)]
    pub roles: Vec<RoleRow>,
}

/// The signed-in viewer as the storefront sees it
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: UserId,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
