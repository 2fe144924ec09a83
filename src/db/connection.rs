use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum StoreMessage {
    Run(Job),
    Close,
}

/// Owns the worker thread; closing it is tied to the last `Database` clone.
struct StoreWorker {
    jobs: mpsc::Sender<StoreMessage>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        if self.jobs.send(StoreMessage::Close).is_err() {
            error!("Session store thread already gone at shutdown");
        }
        if let Err(panic) = handle.join() {
            error!("Session store thread panicked: {panic:?}");
        }
    }
}

/// Handle to the session store.
///
/// One SQLite connection lives on a dedicated thread and runs jobs one at a
/// time, so a read-merge-write inside a single `execute` call is atomic with
/// respect to every other caller of this handle.
#[derive(Clone)]
pub struct Database {
    worker: Arc<StoreWorker>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (jobs_tx, jobs_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread_path = db_path.clone();

        let thread = thread::Builder::new()
            .name("streamtimer-db".into())
            .spawn(move || {
                let conn = match open_connection(&thread_path) {
                    Ok(conn) => {
                        let _ = ready_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                serve_jobs(conn, jobs_rx);
            })
            .context("failed to spawn session store thread")?;

        ready_rx
            .recv()
            .context("session store thread exited during startup")??;

        info!("Session store ready at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(StoreWorker {
                jobs: jobs_tx,
                thread: Mutex::new(Some(thread)),
            }),
        })
    }

    /// Runs `job` on the store thread and waits for its result.
    pub async fn execute<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let message = StoreMessage::Run(Box::new(move |conn| {
            if reply_tx.send(job(conn)).is_err() {
                error!("Session store caller went away before its reply");
            }
        }));

        self.worker
            .jobs
            .send(message)
            .map_err(|_| anyhow!("session store thread is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("session store thread dropped the job"))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

fn serve_jobs(mut conn: Connection, jobs: mpsc::Receiver<StoreMessage>) {
    for message in jobs {
        match message {
            StoreMessage::Run(job) => job(&mut conn),
            StoreMessage::Close => break,
        }
    }
    info!("Session store thread shutting down");
}
