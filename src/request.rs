use crate::connection;
use crate::header::HeaderTable;
use crate::request_line::{RequestLine, Version};

/// ボディまで読み終えた HTTP リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// リクエスト行
    pub line: RequestLine,
    /// ヘッダー
    pub headers: HeaderTable,
    /// ボディ (chunked の場合はデコード済み)
    pub body: Vec<u8>,
}

impl Request {
    pub fn method(&self) -> &str {
        &self.line.method
    }

    pub fn target(&self) -> &str {
        &self.line.target
    }

    pub fn path(&self) -> &str {
        self.line.path()
    }

    pub fn query(&self) -> &str {
        self.line.query()
    }

    pub fn version(&self) -> Version {
        self.line.version
    }

    /// ヘッダーを取得 (大文字小文字を区別しない、最後の値)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// レスポンス後に接続を閉じるべきか
    pub fn should_close(&self, explicit_override: bool) -> bool {
        connection::should_close(self.line.version, &self.headers, explicit_override)
    }
}
