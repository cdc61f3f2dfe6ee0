use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Address, Member, MemberId};
use crate::domain::port::{MemberRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// MySQL会員リポジトリ
/// MySQLデータベースを使用して会員を永続化する
#[derive(Clone)]
pub struct MySqlMemberRepository {
    pool: Pool<MySql>,
}

impl MySqlMemberRepository {
    /// 新しいMySQL会員リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// membersテーブルの行から会員を再構築する
fn member_from_row(row: &MySqlRow) -> Result<Member, RepositoryError> {
    let member_id = MemberId::from_string(row.get("id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("会員IDの解析に失敗しました: {}", e))
    })?;
    let address = Address::new(row.get("city"), row.get("street"), row.get("zipcode"))
        .map_err(|e| RepositoryError::FetchFailed(format!("住所の構築に失敗しました: {}", e)))?;
    Member::new(member_id, row.get("name"), address)
        .map_err(|e| RepositoryError::FetchFailed(format!("会員の再構築に失敗しました: {}", e)))
}

#[async_trait]
impl MemberRepository for MySqlMemberRepository {
    async fn save(&self, member: &Member) -> Result<(), RepositoryError> {
        // 会員データをmembersテーブルにUPSERT
        sqlx::query(
            r#"
            INSERT INTO members (id, name, city, street, zipcode)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                city = VALUES(city),
                street = VALUES(street),
                zipcode = VALUES(zipcode)
            "#,
        )
        .bind(member.id().to_string())
        .bind(member.name())
        .bind(member.address().city())
        .bind(member.address().street())
        .bind(member.address().zipcode())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<Member>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, city, street, zipcode FROM members WHERE id = ?")
            .bind(member_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Member>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, city, street, zipcode FROM members WHERE name = ? ORDER BY seq",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)
        .map_err(RepositoryError::from)?;

        rows.iter().map(member_from_row).collect()
    }

    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, city, street, zipcode FROM members ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .map_err(RepositoryError::from)?;

        rows.iter().map(member_from_row).collect()
    }

    fn next_identity(&self) -> MemberId {
        MemberId::new()
    }
}
