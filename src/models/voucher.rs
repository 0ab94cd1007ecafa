//! Modelo de voucher de combustible
//!
//! La tabla fuel_vouchers pertenece al módulo de vouchers; aquí solo se lee
//! y se marca como BOUND al autorizar una hoja.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::models::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoucherState {
    Available,
    Bound,
    Void,
}

impl VoucherState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherState::Available => "AVAILABLE",
            VoucherState::Bound => "BOUND",
            VoucherState::Void => "VOID",
        }
    }
}

impl FromStr for VoucherState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(VoucherState::Available),
            "BOUND" => Ok(VoucherState::Bound),
            "VOID" => Ok(VoucherState::Void),
            _ => Err(ParseEnumError::new("voucher state", s)),
        }
    }
}

impl TryFrom<String> for VoucherState {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for VoucherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voucher de combustible - mapea a la tabla fuel_vouchers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FuelVoucher {
    pub id: i64,
    pub provider: String,
    pub value: Decimal,
    pub coupon: String,
    #[sqlx(try_from = "String")]
    pub state: VoucherState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FuelVoucher {
    pub fn is_available(&self) -> bool {
        self.state == VoucherState::Available
    }
}
