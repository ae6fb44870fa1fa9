//! Symbolic address resolution
//!
//! Turns a freshly attached process into a map of named [`Pointer`]s. The
//! resolver runs once per attach on a helper thread; the polling loop only
//! checks a readiness flag until the helper publishes its result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use super::{extract_relative_address, parse_pattern, Pointer, ProcessContext};
use crate::config::PointerPathConfig;
use crate::error::{AutosplitterError, Result};

/// Symbolic name -> resolved pointer chain
pub type NamedPointers = HashMap<String, Pointer>;

/// Resolves symbolic names to pointer chains inside an attached process
pub trait AddressResolver: Send + Sync {
    /// Resolve every name this resolver knows about
    ///
    /// Implementations should check `cancel` between expensive steps and bail
    /// out early once it is set.
    fn resolve(&self, process: &ProcessContext, cancel: &AtomicBool) -> Result<NamedPointers>;
}

/// Resolver driven by static pointer paths from the config file
///
/// Each path is either `module_base + module_offset` or, when a signature is
/// given, the RIP-relative target of the matched instruction. The configured
/// offsets are appended to that base.
#[derive(Debug, Clone, Default)]
pub struct StaticAddressResolver {
    paths: Vec<(String, PointerPathConfig)>,
}

impl StaticAddressResolver {
    /// Create a resolver from named pointer paths
    pub fn new(paths: impl IntoIterator<Item = (String, PointerPathConfig)>) -> Self {
        let mut paths: Vec<_> = paths.into_iter().collect();
        paths.sort_by(|a, b| a.0.cmp(&b.0));
        Self { paths }
    }

    /// Number of configured paths
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no paths are configured
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn resolve_base(&self, process: &ProcessContext, name: &str, path: &PointerPathConfig) -> Result<usize> {
        let Some(signature) = &path.pattern else {
            return Ok(process.base_address + path.module_offset as usize);
        };

        let pattern = parse_pattern(signature)
            .ok_or_else(|| AutosplitterError::resolution(format!("{}: malformed pattern", name)))?;
        let instruction = process
            .scan_pattern(&pattern)
            .ok_or_else(|| AutosplitterError::resolution(format!("{}: pattern not found", name)))?;

        let instruction_len = if path.instruction_len == 0 {
            path.rip_offset + 4
        } else {
            path.instruction_len
        };

        extract_relative_address(&*process.reader, instruction, path.rip_offset, instruction_len)
            .map(|target| target + path.module_offset as usize)
            .ok_or(AutosplitterError::MemoryReadFailed {
                address: instruction + path.rip_offset,
            })
    }
}

impl AddressResolver for StaticAddressResolver {
    fn resolve(&self, process: &ProcessContext, cancel: &AtomicBool) -> Result<NamedPointers> {
        let mut resolved = NamedPointers::with_capacity(self.paths.len());

        for (name, path) in &self.paths {
            if cancel.load(Ordering::SeqCst) {
                return Err(AutosplitterError::resolution("cancelled"));
            }

            let base = self.resolve_base(process, name, path)?;
            log::debug!("Resolved {} -> 0x{:X} + {:X?}", name, base, path.offsets);
            resolved.insert(
                name.clone(),
                Pointer::with_values(base as i64, path.offsets.clone(), process.is_64_bit),
            );
        }

        Ok(resolved)
    }
}

/// Address resolution running on a helper thread
///
/// Completion is published through `ready`; the result slot is filled before
/// the flag is raised. Dropping the task cancels and joins the helper.
pub struct ResolutionTask {
    cancel: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
    result: Arc<Mutex<Option<Result<NamedPointers>>>>,
    handle: Option<JoinHandle<()>>,
}

impl ResolutionTask {
    /// Start resolving `process` on a new thread
    pub fn spawn(resolver: Arc<dyn AddressResolver>, process: ProcessContext) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let ready = Arc::new(AtomicBool::new(false));
        let result = Arc::new(Mutex::new(None));

        let handle = {
            let cancel = cancel.clone();
            let ready = ready.clone();
            let result = result.clone();
            std::thread::Builder::new()
                .name("address-resolver".into())
                .spawn(move || {
                    let outcome = resolver.resolve(&process, &cancel);
                    *result.lock() = Some(outcome);
                    ready.store(true, Ordering::SeqCst);
                })
        };

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                *result.lock() = Some(Err(AutosplitterError::ThreadSpawn {
                    name: "address-resolver",
                    source: e,
                }));
                ready.store(true, Ordering::SeqCst);
                None
            }
        };

        Self { cancel, ready, result, handle }
    }

    /// Whether the helper has published its result
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Take the published result, if any
    ///
    /// Returns `None` until the task is ready, and after the result was taken.
    pub fn take_result(&mut self) -> Option<Result<NamedPointers>> {
        if !self.is_ready() {
            return None;
        }
        let outcome = self.result.lock().take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        outcome
    }

    /// Ask the helper to stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Block until the helper finishes
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ResolutionTask {
    fn drop(&mut self) {
        self.cancel();
        self.wait();
    }
}
