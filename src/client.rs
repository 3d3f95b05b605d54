use crate::protocol::{
    self, IsPrimeParams, IsPrimeResponse, ListPrimesParams, ListPrimesResponse, ServerRequest,
    ServerResponse, StatsResponse,
};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

pub struct PrimeClient {
    port: u16,
}

impl PrimeClient {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// リクエストを1件送り、応答の1行を受け取る
    ///
    /// 応答に `error` が入っていれば `Err` にする。
    pub async fn send_request(&self, request: ServerRequest) -> Result<ServerResponse> {
        let stream = TcpStream::connect(("127.0.0.1", self.port))
            .await
            .context("Failed to connect to prime_check server")?;
        let (reader, mut writer) = stream.into_split();

        let mut payload = serde_json::to_vec(&request)?;
        payload.push(b'\n');
        debug!("Sending {} request (id {})", request.method, request.id);
        writer.write_all(&payload).await?;
        writer.flush().await?;

        let response_line = BufReader::new(reader)
            .lines()
            .next_line()
            .await
            .context("Failed to read response")?
            .ok_or_else(|| anyhow::anyhow!("Connection closed before a response arrived"))?;

        let response: ServerResponse =
            serde_json::from_str(response_line.trim()).context("Failed to parse response")?;

        match response.error {
            Some(error) => Err(anyhow::anyhow!("Server error: {}", error)),
            None => Ok(response),
        }
    }

    /// メソッドを呼び出して結果を型付きで受け取る
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = ServerRequest {
            id: REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            method: method.to_string(),
            params,
        };

        let result = self
            .send_request(request)
            .await?
            .result
            .ok_or_else(|| anyhow::anyhow!("No result in response"))?;
        serde_json::from_value(result).with_context(|| format!("Unexpected {} result", method))
    }

    pub async fn is_prime(&self, number: i64) -> Result<IsPrimeResponse> {
        let params = serde_json::to_value(IsPrimeParams { number })?;
        self.call(protocol::methods::IS_PRIME, params).await
    }

    pub async fn list_primes(&self, limit: i64) -> Result<ListPrimesResponse> {
        let params = serde_json::to_value(ListPrimesParams { limit })?;
        self.call(protocol::methods::LIST_PRIMES, params).await
    }

    /// サーバー統計を取得
    pub async fn get_stats(&self) -> Result<StatsResponse> {
        self.call(protocol::methods::GET_STATS, json!({})).await
    }

    /// ヘルスチェック
    pub async fn health_check(&self) -> Result<Value> {
        self.call(protocol::methods::HEALTH_CHECK, json!({})).await
    }

    /// サーバーが起動しているかチェック
    pub async fn is_server_running(&self) -> bool {
        self.health_check().await.is_ok()
    }
}
