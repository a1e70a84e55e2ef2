// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Trace provider abstraction for verbose evaluation
//!
//! Where trace lines go depends on the caller:
//! - CLI: printed to stdout as they are produced
//! - Embedding and tests: collected in memory
//! - Silent runs: dropped

use std::sync::{Arc, Mutex};

/// Sink for verbose trace lines
pub trait TraceProvider: Send + Sync {
    /// Record one trace line
    fn trace(&self, line: &str);

    /// Lines collected so far (empty for providers that do not collect)
    fn collect_traces(&self) -> Vec<String>;

    /// Forget collected lines
    fn clear_traces(&self);
}

/// Prints every line to stdout
#[derive(Debug, Default)]
pub struct StdoutTraceProvider;

impl StdoutTraceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TraceProvider for StdoutTraceProvider {
    fn trace(&self, line: &str) {
        println!("{line}");
    }

    fn collect_traces(&self) -> Vec<String> {
        Vec::new()
    }

    fn clear_traces(&self) {}
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct CollectingTraceProvider {
    traces: Arc<Mutex<Vec<String>>>,
}

impl CollectingTraceProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceProvider for CollectingTraceProvider {
    fn trace(&self, line: &str) {
        if let Ok(mut traces) = self.traces.lock() {
            traces.push(line.to_string());
        }
    }

    fn collect_traces(&self) -> Vec<String> {
        match self.traces.lock() {
            Ok(traces) => traces.clone(),
            Err(_) => Vec::new(),
        }
    }

    fn clear_traces(&self) {
        if let Ok(mut traces) = self.traces.lock() {
            traces.clear();
        }
    }
}

/// Drops every line
#[derive(Debug, Default)]
pub struct NoOpTraceProvider;

impl TraceProvider for NoOpTraceProvider {
    fn trace(&self, _line: &str) {}

    fn collect_traces(&self) -> Vec<String> {
        Vec::new()
    }

    fn clear_traces(&self) {}
}

/// Convenience type for `Arc<dyn TraceProvider>`
pub type SharedTraceProvider = Arc<dyn TraceProvider>;

/// Create a stdout trace provider wrapped in Arc
pub fn create_stdout_provider() -> SharedTraceProvider {
    Arc::new(StdoutTraceProvider::new())
}

/// Create a collecting trace provider wrapped in Arc
pub fn create_collecting_provider() -> SharedTraceProvider {
    Arc::new(CollectingTraceProvider::new())
}

/// Create a no-op trace provider wrapped in Arc
pub fn create_noop_provider() -> SharedTraceProvider {
    Arc::new(NoOpTraceProvider)
}
