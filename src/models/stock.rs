use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;

/// 库存状态（由数量派生，不单独编辑）
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// 根据数量和低库存阈值派生状态
    ///
    /// - `quantity <= 0` → OUT_OF_STOCK
    /// - `quantity <= low_threshold` → LOW_STOCK
    /// - 其余 → IN_STOCK
    pub fn from_quantity(quantity: i32, low_threshold: i32) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= low_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// 搜索结果排序权重，越小越靠前
    pub fn sort_rank(self) -> u8 {
        match self {
            StockStatus::InStock => 0,
            StockStatus::LowStock => 1,
            StockStatus::OutOfStock => 2,
        }
    }

    pub fn is_available(self) -> bool {
        !matches!(self, StockStatus::OutOfStock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_quantity_boundaries() {
        assert_eq!(StockStatus::from_quantity(0, 10), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(-3, 10), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(1, 10), StockStatus::LowStock);
        assert_eq!(StockStatus::from_quantity(10, 10), StockStatus::LowStock);
        assert_eq!(StockStatus::from_quantity(11, 10), StockStatus::InStock);
    }

    #[test]
    fn test_zero_threshold_has_no_low_band() {
        assert_eq!(StockStatus::from_quantity(1, 0), StockStatus::InStock);
        assert_eq!(StockStatus::from_quantity(0, 0), StockStatus::OutOfStock);
    }

    #[test]
    fn test_sort_rank_order() {
        assert!(StockStatus::InStock.sort_rank() < StockStatus::LowStock.sort_rank());
        assert!(StockStatus::LowStock.sort_rank() < StockStatus::OutOfStock.sort_rank());
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(StockStatus::OutOfStock.to_string(), "OUT_OF_STOCK");
        assert_eq!(
            "low_stock".parse::<StockStatus>().unwrap(),
            StockStatus::LowStock
        );
    }
}
