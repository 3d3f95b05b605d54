use serde::{Deserialize, Serialize};

/// サーバー・クライアント間の通信プロトコル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRequest {
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerResponse {
    pub id: u64,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// サーバーへのリクエストメソッド
pub mod methods {
    pub const IS_PRIME: &str = "is_prime";
    pub const LIST_PRIMES: &str = "list_primes";
    pub const GET_STATS: &str = "get_stats";
    pub const HEALTH_CHECK: &str = "health_check";
}

/// list_primes で受け付ける上限値の最大
pub const MAX_LIST_LIMIT: i64 = 1_000_000;

/// is_prime のパラメータ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsPrimeParams {
    pub number: i64,
}

/// is_prime のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsPrimeResponse {
    pub number: i64,
    pub is_prime: bool,
    /// 合成数の場合に見つかった最小の約数
    pub smallest_divisor: Option<i64>,
}

/// list_primes のパラメータ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPrimesParams {
    pub limit: i64,
}

/// list_primes のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPrimesResponse {
    pub limit: i64,
    pub count: usize,
    pub primes: Vec<i64>,
}

/// get_stats のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_requests: u64,
    pub prime_checks: u64,
    pub primes_found: u64,
    pub uptime_seconds: i64,
}

impl From<&crate::server::ServerStats> for StatsResponse {
    fn from(stats: &crate::server::ServerStats) -> Self {
        Self {
            total_requests: stats.total_requests,
            prime_checks: stats.prime_checks,
            primes_found: stats.primes_found,
            uptime_seconds: (chrono::Utc::now() - stats.started_at).num_seconds(),
        }
    }
}
