//! Catalog records
//!
//! Customers, branches and products referenced by sales. They carry no
//! lifecycle beyond create/replace/delete, so fields are public and rows map
//! straight onto them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pricing::{self, MAX_UNIT_PRICE};
use crate::domain::{ValidationFailure, Validator};

use super::Aggregate;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 30;
pub const MAX_ADDRESS_LEN: usize = 250;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_CATEGORY_LEN: usize = 50;

// =========================================================================
// Customer
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn new(name: String, email: String, phone: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Replace every editable field
    pub fn replace(&mut self, name: String, email: String, phone: Option<String>) {
        self.name = name;
        self.email = email;
        self.phone = phone;
        self.updated_at = Some(Utc::now());
    }
}

impl Aggregate for Customer {
    fn aggregate_type() -> &'static str {
        "Customer"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new()
            .text(&self.name, "name", MAX_NAME_LEN)
            .text(&self.email, "email", MAX_EMAIL_LEN)
            .check(self.email.contains('@'), "email", "email must be a valid address")
            .optional_text(self.phone.as_deref(), "phone", MAX_PHONE_LEN)
            .finish()
    }
}

// =========================================================================
// Branch
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Branch {
    pub fn new(name: String, address: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            address,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn replace(&mut self, name: String, address: String) {
        self.name = name;
        self.address = address;
        self.updated_at = Some(Utc::now());
    }
}

impl Aggregate for Branch {
    fn aggregate_type() -> &'static str {
        "Branch"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new()
            .text(&self.name, "name", MAX_NAME_LEN)
            .text(&self.address, "address", MAX_ADDRESS_LEN)
            .finish()
    }
}

// =========================================================================
// Product
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(title: String, description: Option<String>, price: Decimal, category: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            price,
            category,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn replace(
        &mut self,
        title: String,
        description: Option<String>,
        price: Decimal,
        category: String,
    ) {
        self.title = title;
        self.description = description;
        self.price = price;
        self.category = category;
        self.updated_at = Some(Utc::now());
    }
}

impl Aggregate for Product {
    fn aggregate_type() -> &'static str {
        "Product"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new()
            .text(&self.title, "title", MAX_NAME_LEN)
            .optional_text(self.description.as_deref(), "description", MAX_DESCRIPTION_LEN)
            .check(
                pricing::is_valid_unit_price(self.price),
                "price",
                format!("price must be greater than 0 and at most {}", MAX_UNIT_PRICE),
            )
            .check(
                pricing::has_storable_scale(self.price),
                "price",
                format!("price must have at most {} decimal places", pricing::MAX_SCALE),
            )
            .text(&self.category, "category", MAX_CATEGORY_LEN)
            .finish()
    }
}
