#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::{EnvFilter, fmt};

use scenic_core::ports::{ProcessOutput, ProcessRunner};
use scenic_core::{Task, TaskStore};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Output goes through `with_test_writer()`, so it only shows for failing
/// tests. Enable levels with e.g. `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

type Script = dyn Fn(&str, &[String]) -> io::Result<ProcessOutput> + Send + Sync;

/// A fake process runner that:
/// - records every invocation
/// - answers from a closure instead of spawning anything
pub struct FakeRunner {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    script: Box<Script>,
}

impl FakeRunner {
    pub fn new(
        script: impl Fn(&str, &[String]) -> io::Result<ProcessOutput> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|(program, _)| program).collect()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, command: &str, args: &[String]) -> io::Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), args.to_vec()));
        (self.script)(command, args)
    }
}

/// Value following `flag` in an argument list.
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Poll `store` until `done` holds for its task list, or give up after `limit`.
pub async fn wait_until(
    store: &TaskStore,
    limit: Duration,
    done: impl Fn(&[Task]) -> bool,
) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if done(&store.list()) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
