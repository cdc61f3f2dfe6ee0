use crate::domain::error::DomainError;
use crate::domain::model::{Address, MemberId};

/// 会員エンティティ
/// 会員の注文一覧は保持せず、必要な場合は注文側を検索して導出する
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    id: MemberId,
    name: String,
    address: Address,
}

impl Member {
    /// 新しい会員を作成
    /// 名前は空でない必要がある
    pub fn new(id: MemberId, name: String, address: Address) -> Result<Self, DomainError> {
        Self::validate_name(&name)?;
        Ok(Self { id, name, address })
    }

    /// 会員IDを取得
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// 名前を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 住所を取得
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// 名前を変更
    pub fn change_name(&mut self, name: String) -> Result<(), DomainError> {
        Self::validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    fn validate_name(name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "会員名は空にできません".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address::new("aaa".to_string(), "bbb".to_string(), "ccc".to_string()).unwrap()
    }

    #[test]
    fn test_member_creation() {
        let id = MemberId::new();
        let member = Member::new(id, "kim".to_string(), address()).unwrap();
        assert_eq!(member.id(), id);
        assert_eq!(member.name(), "kim");
        assert_eq!(member.address().city(), "aaa");
    }

    #[test]
    fn test_member_with_empty_name_fails() {
        let result = Member::new(MemberId::new(), "  ".to_string(), address());
        assert!(result.is_err());
    }

    #[test]
    fn test_change_name() {
        let mut member = Member::new(MemberId::new(), "kim".to_string(), address()).unwrap();
        member.change_name("lee".to_string()).unwrap();
        assert_eq!(member.name(), "lee");

        assert!(member.change_name(String::new()).is_err());
        assert_eq!(member.name(), "lee");
    }
}
