// ドメイン層
// エンティティ、値オブジェクト、ポート、読み取り側のモデルを定義する

pub mod error;
pub mod model;
pub mod port;
pub mod query;
pub mod service;
