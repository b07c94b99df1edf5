//! # Example: event pipeline
//!
//! Two cooperating tasks joined by a bounded channel, the shape of an
//! event-to-metrics bridge:
//! - `producer` emits events until cancelled
//! - `consumer` aggregates them and fails when the channel closes early
//! - `CancelSiblings` stops the producer if the consumer fails
//! - Ctrl-C (or the 2s deadline) cancels the shared token

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use svcvisor::{Hooks, Logs, Runner, RunnerConfig, TaskError, TaskFn, TaskRef};

#[derive(Debug)]
struct Event {
    subject: &'static str,
    bytes: u64,
}

fn producer(tx: mpsc::Sender<Event>) -> TaskRef {
    let seq = Arc::new(AtomicU64::new(0));

    TaskFn::arc("producer", move |ctx: CancellationToken| {
        let tx = tx.clone();
        let seq = Arc::clone(&seq);

        async move {
            loop {
                let n = seq.fetch_add(1, Ordering::Relaxed);
                let event = Event {
                    subject: if n % 2 == 0 { "orders" } else { "payments" },
                    bytes: 64 + n % 512,
                };

                tokio::select! {
                    _ = ctx.cancelled() => return Err(TaskError::Canceled),
                    sent = tx.send(event) => {
                        if sent.is_err() {
                            return Err(TaskError::fail("consumer went away"));
                        }
                    }
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    })
}

fn consumer(rx: mpsc::Receiver<Event>) -> TaskRef {
    let rx = Arc::new(Mutex::new(rx));

    TaskFn::arc("consumer", move |ctx: CancellationToken| {
        let rx = Arc::clone(&rx);

        async move {
            let mut rx = rx.lock().await;
            let (mut count, mut bytes) = (0u64, 0u64);
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!(count, bytes, "consumer flushed totals");
                        return Err(TaskError::Canceled);
                    }
                    event = rx.recv() => match event {
                        Some(event) => {
                            count += 1;
                            bytes += event.bytes;
                            tracing::debug!(subject = event.subject, bytes = event.bytes, "event");
                        }
                        None => return Err(TaskError::fail("event stream closed")),
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() {
    let _ = Logs::fallback().try_init();

    let (tx, rx) = mpsc::channel(64);
    let mut runner = Runner::with_config(RunnerConfig::cancel_on_failure()).with_hooks(Hooks::logging());
    runner.add(producer(tx));
    runner.add(consumer(rx));

    let token = CancellationToken::new();
    let stop = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = tokio::time::sleep(Duration::from_secs(2)) => {}
        }
        stop.cancel();
    });

    let report = runner.run(token).await;
    for failed in report.failed() {
        eprintln!("{} failed: {}", failed.name, failed.error);
    }
    println!("{} task(s) stopped, {} failed", report.stopped().len(), report.failed().len());
}
