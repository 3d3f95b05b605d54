use crate::primality::{DivisorBound, PrimalityChecker};
use crate::protocol::{
    self, IsPrimeParams, IsPrimeResponse, ListPrimesParams, ListPrimesResponse, ServerRequest,
    ServerResponse, StatsResponse, MAX_LIST_LIMIT,
};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, error, info, warn};

/// デフォルトポート
pub const DEFAULT_PORT: u16 = 7878;

/// 1リクエスト行の最大バイト数
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// サーバー起動以降のリクエスト統計
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub total_requests: u64,
    pub prime_checks: u64,
    pub primes_found: u64,
    pub started_at: DateTime<Utc>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            total_requests: 0,
            prime_checks: 0,
            primes_found: 0,
            started_at: Utc::now(),
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PrimeServer {
    checker: PrimalityChecker,
    stats: Arc<Mutex<ServerStats>>,
}

impl PrimeServer {
    pub fn new() -> Self {
        Self::with_bound(DivisorBound::default())
    }

    pub fn with_bound(bound: DivisorBound) -> Self {
        Self {
            checker: PrimalityChecker::new(bound),
            stats: Arc::new(Mutex::new(ServerStats::new())),
        }
    }

    /// 指定ポートで待ち受けを開始
    pub async fn start(&self, port: u16) -> Result<()> {
        info!("Starting prime_check server on port {}", port);

        let listener = TcpListener::bind(format!("127.0.0.1:{}", port))
            .await
            .context("Failed to bind TCP listener")?;

        self.serve(listener).await
    }

    /// バインド済みのリスナーでクライアント接続を受け付け
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr().context("Failed to read local address")?;
        info!(
            "Server listening on {} (divisor bound: {:?})",
            local_addr,
            self.checker.bound()
        );

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New client connection from: {}", addr);

                    let checker = self.checker;
                    let stats = Arc::clone(&self.stats);
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_client(checker, stats, stream).await {
                            error!("Error handling client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    async fn handle_client(
        checker: PrimalityChecker,
        stats: Arc<Mutex<ServerStats>>,
        mut stream: TcpStream,
    ) -> Result<()> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            let response = match read_request_line(&mut reader, &mut buf).await? {
                RequestLine::Eof => break,
                RequestLine::TooLong => Self::internal_error(anyhow!(
                    "Request line exceeds {} bytes",
                    MAX_LINE_BYTES
                )),
                RequestLine::Complete => match std::str::from_utf8(&buf) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => {
                        let line = line.trim();
                        debug!("Received request: {}", line);
                        match Self::handle_request(&checker, &stats, line).await {
                            Ok(response) => response,
                            Err(e) => Self::internal_error(e),
                        }
                    }
                    Err(e) => Self::internal_error(
                        anyhow::Error::new(e).context("Request is not valid UTF-8"),
                    ),
                },
            };

            let response_json = serde_json::to_string(&response)?;
            debug!("Sending response: {}", response_json);

            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// 行として解釈できなかったリクエストへの応答（IDは不明なので0）
    fn internal_error(e: anyhow::Error) -> ServerResponse {
        error!("Error handling request: {:#}", e);
        ServerResponse {
            id: 0,
            result: None,
            error: Some(format!("Internal error: {:#}", e)),
        }
    }

    async fn handle_request(
        checker: &PrimalityChecker,
        stats: &Arc<Mutex<ServerStats>>,
        request_line: &str,
    ) -> Result<ServerResponse> {
        let request: ServerRequest =
            serde_json::from_str(request_line).context("Failed to parse request")?;

        debug!("Handling method: {}", request.method);
        stats.lock().await.total_requests += 1;

        let result = match request.method.as_str() {
            protocol::methods::IS_PRIME => {
                Self::handle_is_prime(checker, stats, &request.params).await
            }
            protocol::methods::LIST_PRIMES => {
                Self::handle_list_primes(checker, &request.params).await
            }
            protocol::methods::GET_STATS => Self::handle_get_stats(stats).await,
            protocol::methods::HEALTH_CHECK => {
                Ok(json!({ "status": "ok", "timestamp": Utc::now().timestamp() }))
            }
            _ => {
                warn!("Unknown method: {}", request.method);
                return Ok(ServerResponse {
                    id: request.id,
                    result: None,
                    error: Some(format!("Unknown method: {}", request.method)),
                });
            }
        };

        // パラメータ不正などはリクエストIDを付けて返す
        Ok(match result {
            Ok(value) => ServerResponse {
                id: request.id,
                result: Some(value),
                error: None,
            },
            Err(e) => {
                warn!("Request {} failed: {:#}", request.id, e);
                ServerResponse {
                    id: request.id,
                    result: None,
                    error: Some(format!("{:#}", e)),
                }
            }
        })
    }

    async fn handle_is_prime(
        checker: &PrimalityChecker,
        stats: &Arc<Mutex<ServerStats>>,
        params: &Value,
    ) -> Result<Value> {
        let params: IsPrimeParams = serde_json::from_value(params.clone())
            .context("Invalid is_prime parameters")?;

        // 試し割りは長くかかり得るのでブロッキングスレッドで実行
        let number = params.number;
        let checker = *checker;
        let smallest_divisor = task::spawn_blocking(move || checker.smallest_divisor(number))
            .await
            .context("Primality check task failed")?;
        let is_prime = number >= 2 && smallest_divisor.is_none();

        {
            let mut stats = stats.lock().await;
            stats.prime_checks += 1;
            if is_prime {
                stats.primes_found += 1;
            }
        }

        let response = IsPrimeResponse {
            number: params.number,
            is_prime,
            smallest_divisor,
        };
        Ok(serde_json::to_value(response)?)
    }

    async fn handle_list_primes(checker: &PrimalityChecker, params: &Value) -> Result<Value> {
        let params: ListPrimesParams = serde_json::from_value(params.clone())
            .context("Invalid list_primes parameters")?;

        if params.limit > MAX_LIST_LIMIT {
            bail!(
                "Limit {} exceeds the maximum of {}",
                params.limit,
                MAX_LIST_LIMIT
            );
        }

        let limit = params.limit;
        let checker = *checker;
        let primes = task::spawn_blocking(move || checker.primes_up_to(limit))
            .await
            .context("Prime listing task failed")?;
        let response = ListPrimesResponse {
            limit: params.limit,
            count: primes.len(),
            primes,
        };
        Ok(serde_json::to_value(response)?)
    }

    async fn handle_get_stats(stats: &Arc<Mutex<ServerStats>>) -> Result<Value> {
        let stats_guard = stats.lock().await;
        let response = StatsResponse::from(&*stats_guard);
        Ok(serde_json::to_value(response)?)
    }
}

enum RequestLine {
    Eof,
    Complete,
    /// 上限を超えた行。残りは次の改行まで読み捨て済み
    TooLong,
}

/// 改行までを生バイトで読む。UTF-8 の検証は呼び出し側で行う
async fn read_request_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<RequestLine>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES as u64)
        .read_until(b'\n', buf)
        .await?;

    if read == 0 {
        return Ok(RequestLine::Eof);
    }
    if buf.ends_with(b"\n") || buf.len() < MAX_LINE_BYTES {
        return Ok(RequestLine::Complete);
    }

    loop {
        let (consumed, found_newline) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(consumed);
        if found_newline {
            break;
        }
    }

    buf.clear();
    Ok(RequestLine::TooLong)
}

impl Default for PrimeServer {
    fn default() -> Self {
        Self::new()
    }
}
