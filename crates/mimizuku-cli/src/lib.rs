//! # Mimizuku CLI Library
//!
//! EL 分類器のコマンドラインインターフェース
//! オントロジーの読み込み・分類・問い合わせ・事実のダンプを行う

pub mod commands;
pub mod interactive;

pub use commands::*;
pub use interactive::*;
