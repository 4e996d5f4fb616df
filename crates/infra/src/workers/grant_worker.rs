use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use coursegate_events::{EventBus, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// How often a failed message is handed back to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first delivery included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each further failure.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1 << attempt.saturating_sub(1).min(10))
    }
}

/// Worker loop feeding bus messages to a handler.
///
/// The subscription is taken before `spawn` returns, so nothing published
/// afterwards is missed. A message whose handler fails is queued and handed
/// back later per the [`RetryPolicy`]; after the last attempt it is logged
/// and dropped. The handler sees a message more than once, so it must be
/// idempotent.
#[derive(Debug)]
pub struct GrantWorker;

impl GrantWorker {
    pub fn spawn<M, B, H, E>(name: &'static str, bus: &B, handler: H) -> std::io::Result<WorkerHandle>
    where
        M: Send + 'static,
        B: EventBus<M> + ?Sized,
        H: FnMut(&M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        Self::spawn_with_retry(name, bus, RetryPolicy::default(), handler)
    }

    pub fn spawn_with_retry<M, B, H, E>(
        name: &'static str,
        bus: &B,
        retry: RetryPolicy,
        mut handler: H,
    ) -> std::io::Result<WorkerHandle>
    where
        M: Send + 'static,
        B: EventBus<M> + ?Sized,
        H: FnMut(&M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, retry, &mut handler))?;

        Ok(WorkerHandle {
            name,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

struct Retry<M> {
    message: M,
    attempts: u32,
    due: Instant,
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    policy: RetryPolicy,
    handler: &mut H,
) where
    H: FnMut(&M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(100);
    let mut retries: VecDeque<Retry<M>> = VecDeque::new();

    loop {
        if shutdown_rx.try_recv().is_ok() {
            if !retries.is_empty() {
                warn!(worker = name, pending = retries.len(), "worker stopping with retries pending");
            }
            debug!(worker = name, "worker shutting down");
            break;
        }

        let now = Instant::now();
        for _ in 0..retries.len() {
            let Some(retry) = retries.pop_front() else { break };
            if retry.due <= now {
                attempt(name, handler, &policy, &mut retries, retry.message, retry.attempts + 1);
            } else {
                retries.push_back(retry);
            }
        }

        let wait = retries
            .iter()
            .map(|r| r.due.saturating_duration_since(now))
            .min()
            .map_or(tick, |d| d.min(tick));

        match sub.recv_timeout(wait) {
            Ok(msg) => attempt(name, handler, &policy, &mut retries, msg, 1),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) if retries.is_empty() => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => thread::sleep(wait),
        }
    }
}

fn attempt<M, H, E>(
    name: &'static str,
    handler: &mut H,
    policy: &RetryPolicy,
    retries: &mut VecDeque<Retry<M>>,
    message: M,
    attempts: u32,
) where
    H: FnMut(&M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let Err(err) = handler(&message) else {
        return;
    };

    if attempts >= policy.max_attempts {
        error!(worker = name, attempts, error = ?err, "worker handler failed; giving up on message");
        return;
    }

    let delay = policy.delay_after(attempts);
    warn!(worker = name, attempts, retry_in_ms = delay.as_millis() as u64, error = ?err, "worker handler failed; will retry");
    retries.push_back(Retry {
        message,
        attempts,
        due: Instant::now() + delay,
    });
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use coursegate_events::InMemoryEventBus;

    use super::*;

    fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("condition not reached in time");
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn handles_messages_until_shutdown() {
        let bus = InMemoryEventBus::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let handle = GrantWorker::spawn("test-worker", &bus, move |m: &u32| {
            sink.lock().unwrap().push(*m);
            Ok::<(), ()>(())
        })
        .unwrap();

        bus.publish(1).unwrap();
        bus.publish(2).unwrap();
        wait_until(|| seen.lock().unwrap().len() == 2);

        handle.shutdown();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn failed_message_is_retried_until_it_succeeds() {
        let bus = InMemoryEventBus::<u32>::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();

        let handle = GrantWorker::spawn_with_retry("flaky-worker", &bus, fast_retry(5), move |m: &u32| {
            let mut calls = sink.lock().unwrap();
            calls.push(*m);
            let tries = calls.iter().filter(|c| **c == 1).count();
            if *m == 1 && tries < 3 { Err("boom") } else { Ok(()) }
        })
        .unwrap();

        bus.publish(1).unwrap();
        bus.publish(2).unwrap();
        wait_until(|| calls.lock().unwrap().iter().filter(|c| **c == 1).count() == 3);

        handle.shutdown();
        let calls = calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| **c == 1).count(), 3);
        assert_eq!(calls.iter().filter(|c| **c == 2).count(), 1);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let bus = InMemoryEventBus::<u32>::new();
        let calls = Arc::new(Mutex::new(0u32));
        let sink = calls.clone();

        let handle = GrantWorker::spawn_with_retry("hopeless-worker", &bus, fast_retry(3), move |_: &u32| {
            *sink.lock().unwrap() += 1;
            Err::<(), _>("boom")
        })
        .unwrap();

        bus.publish(7).unwrap();
        wait_until(|| *calls.lock().unwrap() == 3);
        thread::sleep(Duration::from_millis(100));

        handle.shutdown();
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Duration::from_millis(10),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
        assert_eq!(policy.delay_after(2), Duration::from_millis(20));
        assert_eq!(policy.delay_after(3), Duration::from_millis(40));
    }
}
