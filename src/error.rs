use thiserror::Error;

/// 入力文字列を整数に変換する際のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("no number was given")]
    Empty,

    #[error("not an integer: {0}")]
    NotAnInteger(String),

    #[error("number out of range for i64: {0}")]
    OutOfRange(String),
}
