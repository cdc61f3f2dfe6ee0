use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// UUIDをラップした識別子型を定義する
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意の識別子を生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDから識別子を作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から識別子を作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(
    /// 会員の一意識別子
    MemberId
);
define_id!(
    /// 商品の一意識別子
    ItemId
);
define_id!(
    /// 注文の一意識別子
    OrderId
);
define_id!(
    /// 注文商品の一意識別子
    OrderItemId
);
define_id!(
    /// 配送の一意識別子
    DeliveryId
);
define_id!(
    /// カテゴリーの一意識別子
    CategoryId
);

/// 金額を表す値オブジェクト
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// 金額から作成
    /// 負の金額は許可しない
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::InvalidValue(format!(
                "金額は0以上である必要があります: {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    /// 0円
    pub fn zero() -> Self {
        Self(0)
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// 金額を加算
    /// 表現できる範囲を超える場合はエラー
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| overflow(format!("{} + {}", self.0, other.0)))
    }

    /// 金額を乗算
    /// 表現できる範囲を超える場合はエラー
    pub fn multiply(&self, factor: u32) -> Result<Money, DomainError> {
        self.0
            .checked_mul(i64::from(factor))
            .map(Money)
            .ok_or_else(|| overflow(format!("{} * {}", self.0, factor)))
    }

    /// 金額の合計
    pub fn total<I: IntoIterator<Item = Money>>(amounts: I) -> Result<Money, DomainError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.add(&amount))
    }
}

fn overflow(expression: String) -> DomainError {
    DomainError::InvalidValue(format!("金額が上限を超えています: {}", expression))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 住所を表す値オブジェクト
/// 生成後は変更できない（変更する場合は新しい値を作る）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    city: String,
    street: String,
    zipcode: String,
}

impl Address {
    /// 新しい住所を作成
    /// バリデーション:
    /// - 市区町村、番地、郵便番号は空でない必要がある
    pub fn new(city: String, street: String, zipcode: String) -> Result<Self, DomainError> {
        if city.trim().is_empty() {
            return Err(DomainError::InvalidAddress(
                "市区町村は空にできません".to_string(),
            ));
        }
        if street.trim().is_empty() {
            return Err(DomainError::InvalidAddress("番地は空にできません".to_string()));
        }
        if zipcode.trim().is_empty() {
            return Err(DomainError::InvalidAddress(
                "郵便番号は空にできません".to_string(),
            ));
        }

        Ok(Self {
            city,
            street,
            zipcode,
        })
    }

    /// 市区町村を取得
    pub fn city(&self) -> &str {
        &self.city
    }

    /// 番地を取得
    pub fn street(&self) -> &str {
        &self.street
    }

    /// 郵便番号を取得
    pub fn zipcode(&self) -> &str {
        &self.zipcode
    }
}

/// 注文のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// 注文済み
    Order,
    /// キャンセル済み
    Cancel,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            OrderStatus::Order => "ORDER",
            OrderStatus::Cancel => "CANCEL",
        };
        write!(f, "{}", status_str)
    }
}

impl OrderStatus {
    /// 文字列からOrderStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "ORDER" => Ok(OrderStatus::Order),
            "CANCEL" => Ok(OrderStatus::Cancel),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な注文ステータス: {}",
                s
            ))),
        }
    }
}

/// 配送のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    /// 配送準備中
    Ready,
    /// 配送完了
    Completed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            DeliveryStatus::Ready => "READY",
            DeliveryStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", status_str)
    }
}

impl DeliveryStatus {
    /// 文字列からDeliveryStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "READY" => Ok(DeliveryStatus::Ready),
            "COMPLETED" => Ok(DeliveryStatus::Completed),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な配送ステータス: {}",
                s
            ))),
        }
    }
}
