//! Customer and company models, read-only to the pipeline.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Customer segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    B2b,
    B2c,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::B2b => "b2b",
            CustomerType::B2c => "b2c",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "b2b" => CustomerType::B2b,
            _ => CustomerType::B2c,
        }
    }
}

/// Customer account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub customer_type: String,
    pub company_id: Option<Uuid>,
}

impl Customer {
    pub fn customer_type(&self) -> CustomerType {
        CustomerType::from_string(&self.customer_type)
    }
}

/// Company record attached to a B2B customer. The tax fields are the
/// eligibility inputs for tax invoice issuance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub company_id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub registration_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
}
