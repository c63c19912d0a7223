use std::future::Future;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppResult;

/// Creates a Redis client for the shared catalog cache
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Pending write handed to the writer task
struct CacheWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis store whose writes go through a background task
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    write_tx: mpsc::UnboundedSender<CacheWrite>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer and waits until every queued write is flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

/// Spawns the writer loop around `write`
fn spawn_writer<W, F>(write: W) -> (mpsc::UnboundedSender<CacheWrite>, CacheWriterHandle)
where
    W: Fn(CacheWrite) -> F + Send + Sync + 'static,
    F: Future<Output = AppResult<()>> + Send + 'static,
{
    let (write_tx, write_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(writer_task(write, write_rx, shutdown_rx));
    (write_tx, CacheWriterHandle { shutdown_tx, task })
}

async fn writer_task<W, F>(
    write: W,
    mut write_rx: mpsc::UnboundedReceiver<CacheWrite>,
    mut shutdown_rx: mpsc::Receiver<()>,
) where
    W: Fn(CacheWrite) -> F,
    F: Future<Output = AppResult<()>>,
{
    tracing::info!("Cache writer task started");

    loop {
        tokio::select! {
            Some(pending) = write_rx.recv() => {
                if let Err(e) = write(pending).await {
                    tracing::error!(error = %e, "Failed to write to Redis cache");
                }
            }
            _ = shutdown_rx.recv() => {
                write_rx.close();
                let mut flushed = 0usize;
                while let Some(pending) = write_rx.recv().await {
                    if let Err(e) = write(pending).await {
                        tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                    } else {
                        flushed += 1;
                    }
                }
                tracing::info!(flushed, "Cache writer task stopped");
                break;
            }
        }
    }
}

impl RedisStore {
    pub async fn new(client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(client).await?;

        let writer_conn = conn.clone();
        let (write_tx, handle) = spawn_writer(move |pending: CacheWrite| {
            let mut conn = writer_conn.clone();
            async move {
                let _: () = conn.set_ex(pending.key, pending.value, pending.ttl).await?;
                Ok(())
            }
        });

        Ok((Self { conn, write_tx }, handle))
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(key).await?;
        Ok(cached)
    }

    pub fn send(&self, key: String, value: String, ttl: u64) {
        if let Err(e) = self.write_tx.send(CacheWrite { key, value, ttl }) {
            tracing::error!(error = %e, "Failed to queue cache write");
        }
    }
}
