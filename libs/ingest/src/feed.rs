use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::IngestAdapter;

// ═══════════════════════════════════════════════════════════════
//  Feed ingress — publisher connections → adapter
// ═══════════════════════════════════════════════════════════════

/// Запустить feed ingress: accept loop поверх заранее bound
/// listener'а, по reader task'у на каждое publisher соединение.
///
/// События одного соединения доставляются в adapter строго
/// последовательно; across соединений total order даёт write lock
/// store'а. Backpressure к publisher'ам нет: ingest не блокирует
/// transport, burst поглощается eviction'ом истории.
pub fn spawn_feed_task(
    listener: TcpListener,
    adapter: Arc<IngestAdapter>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tracing::info!(%peer, "publisher connected");
                            let adapter = adapter.clone();
                            let conn_token = token.clone();
                            tokio::spawn(async move {
                                read_connection(stream, &adapter, conn_token).await;
                                tracing::info!(%peer, "publisher disconnected");
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "accept error");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }
        tracing::info!("feed ingress finished");
    })
}

/// Читать line-framed события из одного соединения до EOF, read
/// ошибки или cancellation. Ошибка закрывает только это соединение.
async fn read_connection(stream: TcpStream, adapter: &IngestAdapter, token: CancellationToken) {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = tokio::select! {
            _ = token.cancelled() => return,
            read = reader.read_until(b'\n', &mut line) => read,
        };
        match read {
            Ok(0) => return, // EOF
            Ok(_) => {
                if let Some((topic, payload)) = parse_frame(&line) {
                    adapter.ingest(topic, payload).await;
                } else {
                    tracing::debug!("bad frame, skipping");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "read error");
                return;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Frame parsing
// ═══════════════════════════════════════════════════════════════

/// Разобрать один line frame `<topic> <payload>`: topic — непустой
/// UTF-8 до первого пробела, payload — остальные байты. Trailing
/// `\n`/`\r` обрезаются.
fn parse_frame(line: &[u8]) -> Option<(&str, &[u8])> {
    let mut frame = line;
    if frame.last() == Some(&b'\n') {
        frame = &frame[..frame.len() - 1];
    }
    if frame.last() == Some(&b'\r') {
        frame = &frame[..frame.len() - 1];
    }

    let sep = frame.iter().position(|&b| b == b' ')?;
    let (topic, payload) = (&frame[..sep], &frame[sep + 1..]);
    if topic.is_empty() {
        return None;
    }
    let topic = std::str::from_utf8(topic).ok()?;
    Some((topic, payload))
}
