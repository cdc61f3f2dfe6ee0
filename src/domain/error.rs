use crate::domain::model::ItemId;

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 在庫不足（在庫は変更されない）
    #[error("Out of stock: item {item_id} requested {requested}, available {available}")]
    OutOfStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },
    /// 無効な数量（例: 0の数量）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 無効な注文状態（例: 配送完了の注文をキャンセルしようとした）
    #[error("Invalid order state: {0}")]
    InvalidOrderState(String),
    /// 無効な住所
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// 取得対象の関連とページングの組み合わせが不正
    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_stock_message_contains_counts() {
        let item_id = ItemId::new();
        let err = DomainError::OutOfStock {
            item_id,
            requested: 6,
            available: 5,
        };

        let message = err.to_string();
        assert!(message.contains(&item_id.to_string()));
        assert!(message.contains("requested 6"));
        assert!(message.contains("available 5"));
    }

    #[test]
    fn test_configuration_error_message() {
        let err = DomainError::Configuration("paging".to_string());
        assert_eq!(err.to_string(), "Configuration error: paging");
    }
}
