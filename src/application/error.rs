use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;
use thiserror::Error;

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラーをラップする
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 同じ名前の会員が既に存在する
    #[error("Duplicate member: {0}")]
    DuplicateMember(String),
}

impl ApplicationError {
    /// 呼び出し側に返すエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            ApplicationError::DomainError(err) => match err {
                DomainError::OutOfStock { .. } => "OUT_OF_STOCK",
                DomainError::Configuration(_) => "CONFIGURATION_ERROR",
                DomainError::InvalidQuantity => "INVALID_QUANTITY",
                DomainError::InvalidOrderState(_) => "INVALID_ORDER_STATE",
                DomainError::InvalidAddress(_) => "INVALID_ADDRESS",
                DomainError::InvalidValue(_) => "INVALID_VALUE",
            },
            ApplicationError::RepositoryError(RepositoryError::Conflict(_)) => "CONFLICT",
            ApplicationError::RepositoryError(_) => "REPOSITORY_ERROR",
            ApplicationError::NotFound(_) => "NOT_FOUND",
            ApplicationError::DuplicateMember(_) => "DUPLICATE_MEMBER",
        }
    }
}
