//! Errors - エラー型と分類
//!
//! 失敗はサイクル単位で隔離される。`ErrorKind` はログ出力時の運用分類。

use thiserror::Error;

/// ErrorKind は失敗の運用分類
///
/// - Configuration: 認証情報の欠落など（ポーリングのたびに失敗する）
/// - Upstream: 取得失敗（通信・タイムアウト・認証拒否・不正なレスポンス）
/// - Delivery: 配送先への送信失敗
/// - Store: 永続化層の失敗
/// - Validation: 登録リクエストの入力不正
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Upstream,
    Delivery,
    Store,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Delivery => "delivery",
            ErrorKind::Store => "store",
            ErrorKind::Validation => "validation",
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("delivery to {url} failed: {message}")]
    Delivery { url: String, message: String },

    #[error("state store error: {0}")]
    Store(String),

    #[error("invalid request: {0}")]
    Validation(String),
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Config(_) => ErrorKind::Configuration,
            RelayError::Upstream(_) | RelayError::MalformedResponse(_) => ErrorKind::Upstream,
            RelayError::Delivery { .. } => ErrorKind::Delivery,
            RelayError::Store(_) => ErrorKind::Store,
            RelayError::Validation(_) => ErrorKind::Validation,
        }
    }
}

impl From<rusqlite::Error> for RelayError {
    fn from(err: rusqlite::Error) -> Self {
        RelayError::Store(err.to_string())
    }
}
