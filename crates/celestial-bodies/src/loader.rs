//! Asynchronous shader-source loading.
//!
//! A [`ShaderSourceLoader`] fetches N named sources in parallel and reports
//! the completed name→text mapping through a single callback. Fetches run on
//! worker threads and report over a channel; the callback itself is invoked by
//! [`LoadBatch::poll`] (or [`LoadBatch::wait`]) on the render-loop thread, so
//! completion never races with per-frame parameter updates.
//!
//! A fetch that never resolves keeps its batch pending forever unless the
//! loader was given a timeout.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Logical name → resolved source text.
pub type SourceMap = BTreeMap<String, String>;

/// Logical name → where to fetch it from.
pub type SourceRequests = BTreeMap<String, SourceLocation>;

/// Completion callback of a [`LoadBatch`].
pub type LoadCallback = Box<dyn FnOnce(Result<SourceMap, LoadError>)>;

/// Errors raised while fetching shader sources.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("shader source file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request for {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("no inline source registered as '{id}'")]
    UnknownInline { id: String },

    #[error("provider cannot fetch {location}")]
    Unsupported { location: SourceLocation },

    #[error("shader source '{name}' failed to load: {source}")]
    Failed {
        name: String,
        #[source]
        source: Box<LoadError>,
    },

    #[error("shader load incomplete, unresolved: {}", .missing.join(", "))]
    Incomplete { missing: Vec<String> },

    #[error("shader source set is missing '{name}'")]
    MissingSource { name: String },
}

/// Where a shader source lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocation {
    /// A file on disk.
    Path(PathBuf),
    /// An HTTP(S) URL.
    Url(String),
    /// Source text embedded in the host, addressed by identifier.
    Inline(String),
}

impl SourceLocation {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        SourceLocation::Path(path.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        SourceLocation::Url(url.into())
    }

    pub fn inline(id: impl Into<String>) -> Self {
        SourceLocation::Inline(id.into())
    }

    /// Inline sources resolve immediately on the calling thread.
    pub fn is_inline(&self) -> bool {
        matches!(self, SourceLocation::Inline(_))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Path(path) => write!(f, "file {}", path.display()),
            SourceLocation::Url(url) => write!(f, "url {url}"),
            SourceLocation::Inline(id) => write!(f, "inline '{id}'"),
        }
    }
}

/// Something that can turn a [`SourceLocation`] into source text.
///
/// Implementations may block; the loader calls them from worker threads.
pub trait SourceProvider: Send + Sync {
    fn fetch(&self, location: &SourceLocation) -> Result<String, LoadError>;
}

/// Reads sources from the filesystem, resolving relative paths against an
/// optional base directory.
#[derive(Clone, Debug, Default)]
pub struct FileProvider {
    base_dir: Option<PathBuf>,
}

impl FileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SourceProvider for FileProvider {
    fn fetch(&self, location: &SourceLocation) -> Result<String, LoadError> {
        let SourceLocation::Path(path) = location else {
            return Err(LoadError::Unsupported {
                location: location.clone(),
            });
        };

        let path = self.resolve(path);
        if !path.exists() {
            return Err(LoadError::FileNotFound { path });
        }
        std::fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })
    }
}

/// Fetches sources over HTTP(S).
#[derive(Clone)]
pub struct HttpProvider {
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpProvider {
    /// `timeout` bounds each individual request, not the batch.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            timeout,
        }
    }
}

impl fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProvider")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl SourceProvider for HttpProvider {
    fn fetch(&self, location: &SourceLocation) -> Result<String, LoadError> {
        let SourceLocation::Url(url) = location else {
            return Err(LoadError::Unsupported {
                location: location.clone(),
            });
        };

        let http_error = |message: String| LoadError::Http {
            url: url.clone(),
            message,
        };
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| http_error(e.to_string()))?;
        response.into_string().map_err(|e| http_error(e.to_string()))
    }
}

/// Source text registered in memory under an identifier.
#[derive(Clone, Debug, Default)]
pub struct InlineProvider {
    sources: HashMap<String, String>,
}

impl InlineProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The star shaders compiled into this crate, registered under their
    /// logical names.
    pub fn star_defaults() -> Self {
        let mut provider = Self::new();
        for (name, source) in crate::shaders::EMBEDDED_STAR_SHADERS {
            provider.insert(name, source);
        }
        provider
    }

    pub fn insert(&mut self, id: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(id.into(), source.into());
    }

    pub fn with_source(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(id, source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceProvider for InlineProvider {
    fn fetch(&self, location: &SourceLocation) -> Result<String, LoadError> {
        let SourceLocation::Inline(id) = location else {
            return Err(LoadError::Unsupported {
                location: location.clone(),
            });
        };
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| LoadError::UnknownInline { id: id.clone() })
    }
}

/// Dispatches each location to the provider for its kind, so one batch can
/// mix files, URLs and inline sources.
#[derive(Clone, Debug, Default)]
pub struct RoutingProvider {
    pub files: FileProvider,
    pub http: HttpProvider,
    pub inline: InlineProvider,
}

impl SourceProvider for RoutingProvider {
    fn fetch(&self, location: &SourceLocation) -> Result<String, LoadError> {
        match location {
            SourceLocation::Path(_) => self.files.fetch(location),
            SourceLocation::Url(_) => self.http.fetch(location),
            SourceLocation::Inline(_) => self.inline.fetch(location),
        }
    }
}

/// Fetches batches of named shader sources.
#[derive(Clone)]
pub struct ShaderSourceLoader {
    provider: Arc<dyn SourceProvider>,
    timeout: Option<Duration>,
}

impl ShaderSourceLoader {
    pub fn new(provider: impl SourceProvider + 'static) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    pub fn from_shared(provider: Arc<dyn SourceProvider>) -> Self {
        Self {
            provider,
            timeout: None,
        }
    }

    /// Give up on a batch that has not fully resolved within `timeout`.
    /// Without one a stalled fetch leaves its batch pending forever.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Start fetching every request. `callback` fires exactly once, after all
    /// of them have resolved; when every request is inline it fires before
    /// this returns.
    pub fn load<F>(&self, requests: SourceRequests, callback: F) -> LoadBatch
    where
        F: FnOnce(Result<SourceMap, LoadError>) + 'static,
    {
        let (sender, receiver) = unbounded();
        let mut batch = LoadBatch {
            receiver,
            pending: requests.keys().cloned().collect(),
            sources: SourceMap::new(),
            failure: None,
            total: requests.len(),
            deadline: self.timeout.map(|t| Instant::now() + t),
            callback: Some(Box::new(callback)),
        };

        info!("Loading {} shader source(s)", batch.total);

        for (name, location) in requests {
            if location.is_inline() {
                let result = self.provider.fetch(&location);
                batch.record(name, result);
            } else {
                self.spawn_fetch(name, location, sender.clone());
            }
        }
        // Only workers hold senders now, so a vanished worker shows up as a
        // disconnect instead of an endless wait.
        drop(sender);

        batch.poll();
        batch
    }

    fn spawn_fetch(
        &self,
        name: String,
        location: SourceLocation,
        sender: Sender<(String, Result<String, LoadError>)>,
    ) {
        let provider = Arc::clone(&self.provider);
        let thread_name = format!("shader-fetch-{name}");
        debug!("Fetching shader source '{}' from {}", name, location);

        let spawned = std::thread::Builder::new().name(thread_name).spawn({
            let name = name.clone();
            let sender = sender.clone();
            move || {
                let result = provider.fetch(&location);
                // The batch may have been dropped; nobody is waiting then.
                let _ = sender.send((name, result));
            }
        });

        if let Err(e) = spawned {
            let _ = sender.send((
                name,
                Err(LoadError::Io {
                    path: PathBuf::new(),
                    source: e,
                }),
            ));
        }
    }
}

/// An in-flight batch of fetches started by [`ShaderSourceLoader::load`].
///
/// Dropping the batch abandons it: outstanding fetches finish in the
/// background and their results are discarded without calling back.
pub struct LoadBatch {
    receiver: Receiver<(String, Result<String, LoadError>)>,
    pending: BTreeSet<String>,
    sources: SourceMap,
    failure: Option<LoadError>,
    total: usize,
    deadline: Option<Instant>,
    callback: Option<LoadCallback>,
}

impl LoadBatch {
    /// Drain finished fetches and fire the callback if the batch is done.
    /// Returns `true` once the callback has fired. Never blocks.
    pub fn poll(&mut self) -> bool {
        if self.callback.is_none() {
            return true;
        }

        let mut disconnected = false;
        loop {
            match self.receiver.try_recv() {
                Ok((name, result)) => self.record(name, result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if self.pending.is_empty() {
            self.complete();
            return true;
        }

        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        if expired || disconnected {
            let missing: Vec<String> = self.pending.iter().cloned().collect();
            warn!(
                "Shader load gave up with {} of {} source(s) unresolved: {}",
                missing.len(),
                self.total,
                missing.join(", ")
            );
            self.fire(Err(LoadError::Incomplete { missing }));
            return true;
        }

        false
    }

    /// Block until the callback has fired. With no timeout configured this
    /// waits as long as the slowest fetch takes.
    pub fn wait(&mut self) {
        while !self.poll() {
            let received = match self.deadline {
                Some(deadline) => match self.receiver.recv_deadline(deadline) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
                },
                None => self.receiver.recv().ok(),
            };
            if let Some((name, result)) = received {
                self.record(name, result);
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.callback.is_none()
    }

    /// Number of requests that have resolved, successfully or not.
    pub fn resolved(&self) -> usize {
        self.total - self.pending.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Sources resolved so far.
    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    fn record(&mut self, name: String, result: Result<String, LoadError>) {
        if !self.pending.remove(&name) {
            return;
        }
        match result {
            Ok(text) => {
                debug!("Resolved shader source '{}' ({} bytes)", name, text.len());
                self.sources.insert(name, text);
            }
            Err(source) => {
                warn!("Shader source '{}' failed: {}", name, source);
                if self.failure.is_none() {
                    self.failure = Some(LoadError::Failed {
                        name,
                        source: Box::new(source),
                    });
                }
            }
        }
    }

    fn complete(&mut self) {
        let result = match self.failure.take() {
            Some(error) => Err(error),
            None => {
                info!("All {} shader source(s) resolved", self.total);
                Ok(std::mem::take(&mut self.sources))
            }
        };
        self.fire(result);
    }

    fn fire(&mut self, result: Result<SourceMap, LoadError>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl fmt::Debug for LoadBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadBatch")
            .field("resolved", &self.resolved())
            .field("total", &self.total)
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Mutex;

    use crossbeam_channel::bounded;

    /// Resolves each URL once the test releases it through a gate channel.
    struct GatedProvider {
        gates: Mutex<HashMap<String, Receiver<()>>>,
    }

    impl GatedProvider {
        fn new(names: &[&str]) -> (Self, HashMap<String, Sender<()>>) {
            let mut gates = HashMap::new();
            let mut releases = HashMap::new();
            for name in names {
                let (tx, rx) = bounded(1);
                gates.insert(name.to_string(), rx);
                releases.insert(name.to_string(), tx);
            }
            (
                Self {
                    gates: Mutex::new(gates),
                },
                releases,
            )
        }
    }

    impl SourceProvider for GatedProvider {
        fn fetch(&self, location: &SourceLocation) -> Result<String, LoadError> {
            let SourceLocation::Url(url) = location else {
                return Err(LoadError::Unsupported {
                    location: location.clone(),
                });
            };
            let gate = self.gates.lock().unwrap().remove(url);
            if let Some(gate) = gate {
                // A dropped release sender means "never resolve".
                if gate.recv().is_err() {
                    std::thread::park();
                }
            }
            Ok(format!("// source of {url}"))
        }
    }

    fn url_requests(names: &[&str]) -> SourceRequests {
        names
            .iter()
            .map(|n| (n.to_string(), SourceLocation::url(*n)))
            .collect()
    }

    fn recording_callback() -> (
        Rc<Cell<usize>>,
        Rc<RefCell<Option<Result<SourceMap, LoadError>>>>,
        impl FnOnce(Result<SourceMap, LoadError>) + 'static,
    ) {
        let calls = Rc::new(Cell::new(0));
        let slot = Rc::new(RefCell::new(None));
        let (c, s) = (Rc::clone(&calls), Rc::clone(&slot));
        let callback = move |result: Result<SourceMap, LoadError>| {
            c.set(c.get() + 1);
            *s.borrow_mut() = Some(result);
        };
        (calls, slot, callback)
    }

    fn wait_for_resolved(batch: &mut LoadBatch, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while batch.resolved() < count && Instant::now() < deadline {
            batch.poll();
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_callback_fires_once_after_all_resolve() {
        let names = ["sphere_vertex", "sphere_fragment", "halo_vertex", "halo_fragment"];
        let (provider, mut releases) = GatedProvider::new(&names);
        let loader = ShaderSourceLoader::new(provider);
        let (calls, slot, callback) = recording_callback();

        let mut batch = loader.load(url_requests(&names), callback);
        assert_eq!(batch.total(), 4);

        // Release out of declaration order; the callback must wait for the last.
        for (i, name) in ["halo_fragment", "sphere_vertex", "halo_vertex"].iter().enumerate() {
            releases.remove(*name).unwrap().send(()).unwrap();
            wait_for_resolved(&mut batch, i + 1);
            assert!(!batch.poll());
            assert_eq!(calls.get(), 0, "fired with only {} resolved", i + 1);
        }

        releases.remove("sphere_fragment").unwrap().send(()).unwrap();
        batch.wait();
        assert!(batch.is_complete());
        assert_eq!(calls.get(), 1);

        // Further polling never fires again.
        assert!(batch.poll());
        batch.wait();
        assert_eq!(calls.get(), 1);

        let sources = slot.borrow_mut().take().unwrap().unwrap();
        assert_eq!(sources.len(), 4);
        assert_eq!(sources["halo_vertex"], "// source of halo_vertex");
    }

    #[test]
    fn test_inline_batch_completes_during_load() {
        let provider = InlineProvider::new()
            .with_source("a", "fn a() {}")
            .with_source("b", "fn b() {}");
        let loader = ShaderSourceLoader::new(provider);
        let (calls, slot, callback) = recording_callback();

        let mut requests = SourceRequests::new();
        requests.insert("first".into(), SourceLocation::inline("a"));
        requests.insert("second".into(), SourceLocation::inline("b"));

        let batch = loader.load(requests, callback);
        assert!(batch.is_complete());
        assert_eq!(calls.get(), 1);
        let sources = slot.borrow_mut().take().unwrap().unwrap();
        assert_eq!(sources["second"], "fn b() {}");
    }

    #[test]
    fn test_empty_batch_completes_immediately() {
        let loader = ShaderSourceLoader::new(InlineProvider::new());
        let (calls, slot, callback) = recording_callback();
        let batch = loader.load(SourceRequests::new(), callback);
        assert!(batch.is_complete());
        assert_eq!(calls.get(), 1);
        assert!(slot.borrow_mut().take().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_failed_fetch_reports_error_after_all_resolve() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.wgsl"), "// ok").unwrap();

        let loader = ShaderSourceLoader::new(FileProvider::new().with_base_dir(dir.path()));
        let (calls, slot, callback) = recording_callback();

        let mut requests = SourceRequests::new();
        requests.insert("ok".into(), SourceLocation::path("ok.wgsl"));
        requests.insert("missing".into(), SourceLocation::path("missing.wgsl"));

        let mut batch = loader.load(requests, callback);
        batch.wait();
        assert_eq!(calls.get(), 1);
        assert_eq!(batch.resolved(), 2);

        let result = slot.borrow_mut().take().unwrap();
        match result {
            Err(LoadError::Failed { name, source }) => {
                assert_eq!(name, "missing");
                assert!(matches!(*source, LoadError::FileNotFound { .. }));
            }
            other => panic!("expected a failed load, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_reports_incomplete() {
        let names = ["fast", "stalled"];
        let (provider, mut releases) = GatedProvider::new(&names);
        let loader = ShaderSourceLoader::new(provider).with_timeout(Duration::from_millis(50));
        let (calls, slot, callback) = recording_callback();

        let mut batch = loader.load(url_requests(&names), callback);
        releases.remove("fast").unwrap().send(()).unwrap();
        // Keep the stalled gate open but never released.
        let _stalled = releases.remove("stalled");

        batch.wait();
        assert_eq!(calls.get(), 1);
        match slot.borrow_mut().take().unwrap() {
            Err(LoadError::Incomplete { missing }) => assert_eq!(missing, vec!["stalled"]),
            other => panic!("expected incomplete load, got {other:?}"),
        }
    }

    #[test]
    fn test_without_timeout_stalled_fetch_stays_pending() {
        let (provider, _releases) = GatedProvider::new(&["stalled"]);
        let loader = ShaderSourceLoader::new(provider);
        let (calls, _slot, callback) = recording_callback();

        let mut batch = loader.load(url_requests(&["stalled"]), callback);
        std::thread::sleep(Duration::from_millis(20));
        assert!(!batch.poll());
        assert_eq!(batch.resolved(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_independent_batches_do_not_share_results() {
        let provider = InlineProvider::new().with_source("x", "one");
        let loader = ShaderSourceLoader::new(provider);

        let (calls_a, _, cb_a) = recording_callback();
        let (calls_b, _, cb_b) = recording_callback();
        let mut requests = SourceRequests::new();
        requests.insert("x".into(), SourceLocation::inline("x"));

        let _a = loader.load(requests.clone(), cb_a);
        let _b = loader.load(requests, cb_b);
        assert_eq!(calls_a.get(), 1);
        assert_eq!(calls_b.get(), 1);
    }

    #[test]
    fn test_providers_reject_foreign_locations() {
        let url = SourceLocation::url("http://example.invalid/a.wgsl");
        assert!(matches!(
            FileProvider::new().fetch(&url),
            Err(LoadError::Unsupported { .. })
        ));
        assert!(matches!(
            InlineProvider::new().fetch(&SourceLocation::path("a.wgsl")),
            Err(LoadError::Unsupported { .. })
        ));
        assert!(matches!(
            InlineProvider::new().fetch(&SourceLocation::inline("nope")),
            Err(LoadError::UnknownInline { .. })
        ));
    }

    #[test]
    fn test_routing_provider_dispatches_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("disk.wgsl"), "// disk").unwrap();
        let provider = RoutingProvider {
            files: FileProvider::new().with_base_dir(dir.path()),
            inline: InlineProvider::new().with_source("mem", "// mem"),
            ..Default::default()
        };
        assert_eq!(
            provider.fetch(&SourceLocation::path("disk.wgsl")).unwrap(),
            "// disk"
        );
        assert_eq!(provider.fetch(&SourceLocation::inline("mem")).unwrap(), "// mem");
    }
}
