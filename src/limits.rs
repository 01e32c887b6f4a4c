/// パーサーの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserLimits {
    /// 最大バッファサイズ (デフォルト: 2MB)
    ///
    /// 未消費のバイト列の合計。チャンクは丸ごとバッファに乗るため
    /// `max_chunk_size` より大きくしておく。
    pub max_buffer_size: usize,
    /// 最大ヘッダーブロックサイズ (デフォルト: 16KB)
    ///
    /// 終端 (CRLF CRLF) が見つからないまま蓄積されたバイト数がこれを超えるとエラー。
    pub max_header_block_size: usize,
    /// 最大チャンクサイズ行長 (デフォルト: 64バイト)
    pub max_chunk_line_size: usize,
    /// 最大チャンクサイズ (デフォルト: 1MB)
    ///
    /// チャンクは CRLF まで揃ってから返すため、1 チャンク分はバッファに乗る。
    pub max_chunk_size: u64,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 2 * 1024 * 1024, // 2MB
            max_header_block_size: 16 * 1024, // 16KB
            max_chunk_line_size: 64,          // 64 bytes
            max_chunk_size: 1024 * 1024,      // 1MB
        }
    }
}

impl ParserLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_buffer_size: usize::MAX,
            max_header_block_size: usize::MAX,
            max_chunk_line_size: usize::MAX,
            max_chunk_size: u64::MAX,
        }
    }
}
