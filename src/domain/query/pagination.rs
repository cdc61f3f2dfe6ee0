use crate::domain::error::DomainError;
use crate::domain::query::LoadStrategy;

/// IN句でまとめて取得する際の1回あたりの最大件数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchSize(usize);

impl BatchSize {
    pub const DEFAULT: BatchSize = BatchSize(100);

    /// 1以上である必要がある
    pub fn new(size: usize) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::Configuration(
                "バッチサイズは1以上である必要があります".to_string(),
            ));
        }
        Ok(Self(size))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 呼び出し側から受け取った未検証のページング指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

/// 検証済みのページ範囲
/// PaginationGuardを通してのみ作成される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    offset: usize,
    limit: usize,
}

impl Page {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// ページングと読み込み戦略の組み合わせを検証する
pub struct PaginationGuard;

impl PaginationGuard {
    /// offset/limitを検証する
    ///
    /// # Returns
    /// * `Ok(Page)` - 検証済みのページ範囲
    /// * `Err(DomainError::Configuration)` - limitが0以下、offsetが負、
    ///   または行数が増える戦略とページングの組み合わせ
    pub fn validate(strategy: LoadStrategy, offset: i64, limit: i64) -> Result<Page, DomainError> {
        if limit <= 0 {
            return Err(DomainError::Configuration(format!(
                "limitは1以上である必要があります: {}",
                limit
            )));
        }
        if offset < 0 {
            return Err(DomainError::Configuration(format!(
                "offsetは0以上である必要があります: {}",
                offset
            )));
        }
        if !strategy.supports_paging() {
            return Err(DomainError::Configuration(format!(
                "{}戦略はページングと組み合わせられません（対多の結合で行数が増えるため）",
                strategy.name()
            )));
        }

        let offset = usize::try_from(offset)
            .map_err(|_| DomainError::Configuration(format!("offsetが大きすぎます: {}", offset)))?;
        let limit = usize::try_from(limit)
            .map_err(|_| DomainError::Configuration(format!("limitが大きすぎます: {}", limit)))?;
        Ok(Page { offset, limit })
    }

    /// 省略可能なページング指定を検証する
    pub fn validate_request(
        strategy: LoadStrategy,
        page: Option<PageRequest>,
    ) -> Result<Option<Page>, DomainError> {
        page.map(|page| Self::validate(strategy, page.offset, page.limit))
            .transpose()
    }
}
