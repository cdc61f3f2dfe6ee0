use crate::domain::error::DomainError;
use crate::domain::model::{Address, DeliveryId, DeliveryStatus};

/// 配送エンティティ
/// 注文に排他的に所有される
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    id: DeliveryId,
    address: Address,
    status: DeliveryStatus,
}

impl Delivery {
    /// 配送準備中の配送を作成
    /// 住所は注文時点の会員住所のコピーで、以後は会員側の変更の影響を受けない
    pub fn ready(id: DeliveryId, address: Address) -> Self {
        Self {
            id,
            address,
            status: DeliveryStatus::Ready,
        }
    }

    /// データベースから取得したデータで配送を再構築
    pub fn reconstruct(id: DeliveryId, address: Address, status: DeliveryStatus) -> Self {
        Self {
            id,
            address,
            status,
        }
    }

    pub fn id(&self) -> DeliveryId {
        self.id
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// 配送完了にする
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status == DeliveryStatus::Completed {
            return Err(DomainError::InvalidOrderState(
                "既に配送完了です".to_string(),
            ));
        }
        self.status = DeliveryStatus::Completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_delivery() {
        let address =
            Address::new("aaa".to_string(), "bbb".to_string(), "ccc".to_string()).unwrap();
        let mut delivery = Delivery::ready(DeliveryId::new(), address.clone());
        assert_eq!(delivery.status(), DeliveryStatus::Ready);
        assert_eq!(delivery.address(), &address);

        delivery.complete().unwrap();
        assert_eq!(delivery.status(), DeliveryStatus::Completed);
        assert!(delivery.complete().is_err());
    }
}
