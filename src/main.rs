use anyhow::Context;
use clap::{Parser, Subcommand};
use prime_check::client::PrimeClient;
use prime_check::server::{DEFAULT_PORT, PrimeServer};
use prime_check::{DivisorBound, PrimalityChecker, parse_number};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "prime_check")]
#[command(about = "Primality checker with a small JSON-lines service")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a number (reads stdin when omitted)
    Check {
        /// Number to classify
        #[arg(allow_hyphen_values = true)]
        number: Option<String>,

        /// Divisor search bound
        #[arg(short, long, value_enum, default_value_t = DivisorBound::Sqrt)]
        bound: DivisorBound,
    },
    /// List the primes up to a limit
    List {
        /// Upper limit (inclusive)
        #[arg(allow_hyphen_values = true)]
        limit: i64,

        /// Print only the number of primes
        #[arg(short, long)]
        count: bool,

        /// Divisor search bound
        #[arg(short, long, value_enum, default_value_t = DivisorBound::Sqrt)]
        bound: DivisorBound,
    },
    /// Start the primality server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Divisor search bound
        #[arg(short, long, value_enum, default_value_t = DivisorBound::Sqrt)]
        bound: DivisorBound,
    },
    /// Ask a running server whether a number is prime
    Query {
        #[arg(allow_hyphen_values = true)]
        number: i64,

        /// Port to connect to
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Check server status
    Status {
        /// Port to check
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // ログはstderrに出力（stdoutは結果用）
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prime_check=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { number, bound } => check_number(number, bound).await,
        Commands::List {
            limit,
            count,
            bound,
        } => {
            list_primes(limit, count, bound);
            Ok(())
        }
        Commands::Serve { port, bound } => {
            info!("Starting prime_check server (bound: {:?})", bound);
            let server = PrimeServer::with_bound(bound);

            println!("\n🚀 Prime Check Service Started\n");
            println!("  ✅ TCP Server:    127.0.0.1:{port}");
            println!("  ✅ Divisor bound: {bound:?}\n");
            println!("Press Ctrl+C to stop the server\n");

            server.start(port).await
        }
        Commands::Query { number, port } => {
            let client = PrimeClient::new(port);
            let answer = client.is_prime(number).await?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
            Ok(())
        }
        Commands::Status { port } => check_server_status(port).await,
    }
}

async fn check_number(number: Option<String>, bound: DivisorBound) -> Result<(), anyhow::Error> {
    let text = match number {
        Some(text) => text,
        None => {
            print!("Enter a positive integer: ");
            std::io::stdout().flush()?;

            let mut reader = BufReader::new(tokio::io::stdin()).lines();
            reader
                .next_line()
                .await
                .context("Failed to read from stdin")?
                .unwrap_or_default()
        }
    };

    let n = parse_number(&text)?;
    let checker = PrimalityChecker::new(bound);
    debug!("Checking {} with {:?} bound", n, bound);

    println!("{}", checker.classify(n));
    Ok(())
}

fn list_primes(limit: i64, count: bool, bound: DivisorBound) {
    let checker = PrimalityChecker::new(bound);

    if count {
        println!("{}", checker.count_primes(limit));
    } else {
        for prime in checker.primes_up_to(limit) {
            println!("{prime}");
        }
    }
}

async fn check_server_status(port: u16) -> Result<(), anyhow::Error> {
    let client = PrimeClient::new(port);

    if client.is_server_running().await {
        let stats = client.get_stats().await?;
        println!("✅ Server is running on port {port}");
        println!("📊 Stats: {}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("❌ Server is not running on port {port}");
        std::process::exit(1);
    }

    Ok(())
}
