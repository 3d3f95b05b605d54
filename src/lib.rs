//! 素数判定ライブラリと、それを公開する JSON-lines サービス

pub mod client;
pub mod error;
pub mod primality;
pub mod protocol;
pub mod server;

pub use error::InputError;
pub use primality::{
    Classification, DivisorBound, PrimalityChecker, classify, is_prime, parse_number,
};
