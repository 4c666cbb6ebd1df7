//! Watch mode.
//!
//! [`WatchMachine`] is the debounce/single-flight state machine, driven purely
//! by the instants it is handed. [`Watcher::start`] wires it to a `notify`
//! watcher and a worker thread that owns the compile function.
//!
//! A debounce deadline that expires while a compile is running is dropped
//! with a log line; it is not queued for a trailing pass.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::compiler::{CompileReport, Compiler};
use crate::config::CompilerConfig;
use crate::error::{IgniteError, Result};

/// Upper bound on how long the worker blocks without a deadline.
const IDLE_POLL: Duration = Duration::from_millis(250);

// ═══════════════════════════════════════════════════════════════════════════════
// STATE MACHINE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    /// A change was seen and the debounce deadline is armed.
    Pending,
    Compiling,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Nothing due; wait at most this long (forever if `None`).
    Wait(Option<Duration>),
    /// The deadline fired while idle; run a compile pass now.
    Compile,
    /// The deadline fired during a compile and was dropped.
    Skip,
    Stopped,
}

#[derive(Debug)]
pub struct WatchMachine {
    state: WatchState,
    deadline: Option<Instant>,
    debounce: Duration,
}

impl WatchMachine {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: WatchState::Idle,
            deadline: None,
            debounce,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A relevant file changed at `at`: (re)arm the deadline.
    pub fn on_change(&mut self, at: Instant) {
        match self.state {
            WatchState::Stopped => {}
            WatchState::Idle | WatchState::Pending => {
                self.deadline = Some(at + self.debounce);
                self.state = WatchState::Pending;
            }
            // The timer runs independently of an in-flight pass.
            WatchState::Compiling => self.deadline = Some(at + self.debounce),
        }
    }

    pub fn poll(&mut self, now: Instant) -> WatchAction {
        if self.state == WatchState::Stopped {
            return WatchAction::Stopped;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                if self.state == WatchState::Compiling {
                    WatchAction::Skip
                } else {
                    self.state = WatchState::Compiling;
                    WatchAction::Compile
                }
            }
            Some(deadline) => WatchAction::Wait(Some(deadline - now)),
            None => WatchAction::Wait(None),
        }
    }

    /// The in-flight pass ended, successfully or not.
    pub fn finish_compile(&mut self) {
        if self.state == WatchState::Compiling {
            self.state = if self.deadline.is_some() {
                WatchState::Pending
            } else {
                WatchState::Idle
            };
        }
    }

    /// Cancel any deadline and enter the terminal state. Returns `false` if
    /// the machine was already stopped.
    pub fn stop(&mut self) -> bool {
        self.deadline = None;
        let was_running = self.state != WatchState::Stopped;
        self.state = WatchState::Stopped;
        was_running
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT FILTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Decides which filesystem paths can affect compile output.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    /// Screens directory as configured and, when it differs, canonicalized.
    screens_roots: Vec<PathBuf>,
    output_roots: Vec<PathBuf>,
    extension: String,
    ignore: Vec<String>,
}

fn with_canonical(path: PathBuf) -> Vec<PathBuf> {
    match std::fs::canonicalize(&path) {
        Ok(canonical) if canonical != path => vec![path, canonical],
        _ => vec![path],
    }
}

impl SourceFilter {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            screens_roots: with_canonical(config.screens_path()),
            output_roots: with_canonical(config.output_path()),
            extension: config.extension.clone(),
            ignore: config.ignore.clone(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.output_roots.iter().any(|root| path.starts_with(root)) {
            return false;
        }
        if !path.extension().is_some_and(|ext| ext == self.extension.as_str()) {
            return false;
        }
        let Some(rel) = self
            .screens_roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
        else {
            return false;
        };
        !rel.components().any(|c| match c {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                name.starts_with('.') || self.ignore.iter().any(|i| *i == name)
            }
            _ => false,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WATCHER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
enum WatchMessage {
    Changed { path: PathBuf, at: Instant },
    Stop,
}

pub struct Watcher;

impl Watcher {
    /// Compile once, then recompile on every debounced change until stopped.
    ///
    /// Fails without compiling when the screens directory is missing. A
    /// failed initial compile is logged and watching starts anyway.
    pub fn start<F>(config: CompilerConfig, mut compile: F) -> Result<WatchHandle>
    where
        F: FnMut() -> Result<CompileReport> + Send + 'static,
    {
        let screens_dir = config.screens_path();
        if !screens_dir.is_dir() {
            error!(dir = %screens_dir.display(), "screens directory not found");
            return Err(IgniteError::ScreensDirMissing(screens_dir));
        }

        run_compile(&mut compile, "initial");

        let (tx, rx) = mpsc::channel();
        let filter = SourceFilter::new(&config);
        let event_tx = tx.clone();
        let mut fs_watcher =
            notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        if !matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) {
                            return;
                        }
                        if let Some(path) = event.paths.iter().find(|p| filter.matches(p)) {
                            let _ = event_tx.send(WatchMessage::Changed {
                                path: path.clone(),
                                at: Instant::now(),
                            });
                        }
                    }
                    Err(e) => warn!(error = %e, "file watcher error"),
                }
            })?;
        fs_watcher.watch(&screens_dir, RecursiveMode::Recursive)?;
        info!(dir = %screens_dir.display(), "watching for changes");

        let stopped = Arc::new(AtomicBool::new(false));
        let worker_stopped = Arc::clone(&stopped);
        let debounce = config.debounce();
        let worker = thread::Builder::new()
            .name("ignite-watch".to_string())
            .spawn(move || run_worker(rx, worker_stopped, debounce, compile))
            .map_err(|e| IgniteError::io(&screens_dir, e))?;

        Ok(WatchHandle {
            fs_watcher: Some(fs_watcher),
            worker: Some(worker),
            tx,
            stopped,
        })
    }

    /// Watch a project with the default compiler.
    pub fn start_project(config: CompilerConfig) -> Result<WatchHandle> {
        let compiler = Compiler::new(config.clone());
        Self::start(config, move || compiler.compile())
    }
}

fn run_compile<F>(compile: &mut F, reason: &str)
where
    F: FnMut() -> Result<CompileReport>,
{
    match compile() {
        Ok(report) => info!(
            reason,
            files = report.files.len(),
            written = report.written(),
            "compiled"
        ),
        Err(e) => error!(reason, error = %e, "compile failed"),
    }
}

fn run_worker<F>(
    rx: mpsc::Receiver<WatchMessage>,
    stopped: Arc<AtomicBool>,
    debounce: Duration,
    mut compile: F,
) where
    F: FnMut() -> Result<CompileReport>,
{
    let mut machine = WatchMachine::new(debounce);

    while !stopped.load(Ordering::SeqCst) {
        match machine.poll(Instant::now()) {
            WatchAction::Stopped => break,
            WatchAction::Skip => {
                warn!("compilation already in progress, skipping");
                continue;
            }
            WatchAction::Compile => {
                run_compile(&mut compile, "change");
                // Replay what arrived mid-pass at its real arrival time.
                while let Ok(message) = rx.try_recv() {
                    match message {
                        WatchMessage::Changed { path, at } => {
                            if machine.poll(at) == WatchAction::Skip {
                                warn!("compilation already in progress, skipping");
                            }
                            debug!(path = %path.display(), "change during compile");
                            machine.on_change(at);
                        }
                        WatchMessage::Stop => {
                            machine.stop();
                        }
                    }
                }
                if machine.poll(Instant::now()) == WatchAction::Skip {
                    warn!("compilation already in progress, skipping");
                }
                machine.finish_compile();
                continue;
            }
            WatchAction::Wait(timeout) => {
                match rx.recv_timeout(timeout.unwrap_or(IDLE_POLL)) {
                    Ok(WatchMessage::Changed { path, at }) => {
                        debug!(path = %path.display(), "source changed");
                        machine.on_change(at);
                    }
                    Ok(WatchMessage::Stop) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        machine.stop();
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
            }
        }
    }

    machine.stop();
    debug!("watch worker exited");
}

/// Running watch session. Dropping it stops the session.
pub struct WatchHandle {
    fs_watcher: Option<RecommendedWatcher>,
    worker: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<WatchMessage>,
    stopped: Arc<AtomicBool>,
}

impl WatchHandle {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stop watching and wait for the worker. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.fs_watcher.take();
        let _ = self.tx.send(WatchMessage::Stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("watch worker panicked");
            }
        }
        info!("stopped watching");
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
