use std::sync::mpsc::channel;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::thread::JoinHandle;

use crate::{log_error, Cmd, Result};

/// Executes a sequence of commands in parallel, streaming results as they
/// complete. Used to fan out install-time pre-cache fetches.
pub fn parallel_stream<T>(cmds: impl IntoIterator<Item = Cmd<T>>) -> Receiver<Result<T>>
where
    T: Send + 'static,
{
    let (sender, receiver) = channel();
    let mut cmd_handles = Vec::new();
    for cmd in cmds.into_iter() {
        let sender = sender.clone();
        let handle = std::thread::spawn(move || {
            let cmd_info = cmd();
            sender.send(cmd_info).unwrap_or_default();
        });
        cmd_handles.push(handle);
    }
    drop(sender);
    receiver
}

/// Executor for detached tasks - work the caller intentionally does not await,
/// such as stale-while-revalidate refreshes. Task failures are caught and
/// logged, never propagated.
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, task: Cmd<()>);
    /// Block until all outstanding tasks have finished. One-shot hosts call
    /// this before exit so a refresh is not killed mid-write; long-running
    /// hosts never do.
    fn wait(&self) {}
}

/// Runs each task on its own detached thread.
#[derive(Default)]
pub struct ThreadSpawner {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, task: Cmd<()>) {
        let handle = std::thread::spawn(move || {
            if let Err(err) = task() {
                log_error!("detached task failed: {}", err);
            }
        });
        self.handles.lock().unwrap().push(handle);
    }

    fn wait(&self) {
        let handles: Vec<JoinHandle<()>> = self.handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            handle.join().unwrap_or_default();
        }
    }
}

/// Runs tasks synchronously at spawn time. Makes stale-while-revalidate
/// refreshes deterministic for tests and one-shot command line runs.
pub struct InlineSpawner;

impl TaskSpawner for InlineSpawner {
    fn spawn(&self, task: Cmd<()>) {
        if let Err(err) = task() {
            log_error!("detached task failed: {}", err);
        }
    }
}
