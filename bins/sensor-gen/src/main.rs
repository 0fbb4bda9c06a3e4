mod sensor;

use std::time::Duration;

use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use sensor::{Reading, Rng};

#[derive(Parser)]
#[command(name = "sensor-gen", about = "Генератор синтетических sensor readings")]
struct Cli {
    /// Адрес feed ingress'а hub'а
    #[arg(long, default_value = "127.0.0.1:1883", env = "HUB_ADDR")]
    addr: String,
    /// Topic публикации
    #[arg(long, default_value = "home/livingroom/temperature")]
    topic: String,
    /// Интервал между readings, миллисекунды
    #[arg(long, default_value_t = 2000)]
    interval_ms: u64,
    /// Сколько readings отправить (0 = до Ctrl+C)
    #[arg(long, default_value_t = 0)]
    count: u64,
    /// Seed для PRNG (0 = от системного времени)
    #[arg(long, default_value_t = 0)]
    seed: i64,
}

#[derive(Debug, thiserror::Error)]
enum SensorGenError {
    #[error("connect {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), SensorGenError> {
    let mut rng = Rng::new(cli.seed);
    let mut conn = connect(&cli.addr).await?;
    tracing::info!(addr = %cli.addr, topic = %cli.topic, "connected");

    let mut interval = tokio::time::interval(Duration::from_millis(cli.interval_ms));
    let mut sent = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => {
                let reading = Reading::next(&mut rng);
                let line = format!("{} {}\n", cli.topic, serde_json::to_string(&reading)?);
                if let Err(e) = conn.write_all(line.as_bytes()).await {
                    // Hub restarted or dropped us: reconnect once and resend.
                    tracing::warn!(error = %e, "send failed, reconnecting");
                    conn = connect(&cli.addr).await?;
                    if let Err(e) = conn.write_all(line.as_bytes()).await {
                        tracing::error!(error = %e, "resend failed, skipping reading");
                        continue;
                    }
                }
                sent += 1;
                tracing::info!(
                    topic = %cli.topic,
                    temperature = reading.temperature,
                    humidity = reading.humidity,
                    "published"
                );
                if cli.count > 0 && sent >= cli.count {
                    break;
                }
            }
        }
    }

    println!("sent {sent} readings");
    Ok(())
}

async fn connect(addr: &str) -> Result<TcpStream, SensorGenError> {
    TcpStream::connect(addr)
        .await
        .map_err(|e| SensorGenError::Connect {
            addr: addr.to_string(),
            source: e,
        })
}
