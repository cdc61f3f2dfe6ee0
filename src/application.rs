// アプリケーション層
// ユースケースの調整、読み込み戦略の選択、応答形への変換を行う

pub mod error;
pub mod projection;
pub mod service;

pub use error::ApplicationError;
