//! ヘルスチェックレスポンスの解釈
//!
//! 監視対象サービスは任意の内容を返しうるため、ボディは防御的に解釈する。

use control_interface_common::protocol::HealthReport;
use serde_json::{Map, Value};

/// 解釈できないレスポンスの場合に記録するエラーメッセージ
pub const UNPARSEABLE_MESSAGE: &str = "No parseable response from service";

/// 解釈済みのヘルスチェック結果
#[derive(Debug, Clone, PartialEq)]
pub enum HealthResponse {
    /// `{"up": bool, "result": {...}}` 形式で解釈できた
    Structured {
        /// サービスが申告した稼働状態（欠落時false）
        up: bool,
        /// チェック名→詳細（欠落・null時は空）
        result: Map<String, Value>,
    },
    /// 通信失敗・タイムアウト・非2xx・形式不正
    Unparseable,
}

impl HealthResponse {
    /// 2xxレスポンスのボディを解釈する
    ///
    /// JSONオブジェクトでない、または `up`/`result` の型が合わない場合は `Unparseable`。
    pub fn from_body(body: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return Self::Unparseable,
        };

        // 配列も構造体として読めてしまうため、オブジェクト以外は先に弾く
        if !value.is_object() {
            return Self::Unparseable;
        }

        match serde_json::from_value::<HealthReport>(value) {
            Ok(report) => Self::Structured {
                up: report.up,
                result: report.result,
            },
            Err(_) => Self::Unparseable,
        }
    }

    /// Statusに記録する `(up, result)` に変換
    pub fn into_outcome(self) -> (bool, Map<String, Value>) {
        match self {
            Self::Structured { up, result } => (up, result),
            Self::Unparseable => {
                let mut result = Map::new();
                result.insert(
                    "error".to_string(),
                    Value::String(UNPARSEABLE_MESSAGE.to_string()),
                );
                (false, result)
            }
        }
    }
}
