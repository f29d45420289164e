//! Test fixtures and data for chaos monkey tests
//!
//! `FakeRemoteProcess` is an in-memory process with real liveness state, so
//! scheduler and rolling restart behaviour can be observed end to end.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chaosmonkey::{ChaosError, ChaosResult, ProcessRef, RemoteProcess, TransportErrorKind};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SERVICE: &'static str = "zookeeper";
    pub const OTHER_SERVICE: &'static str = "hbase-regionserver";

    pub fn address(index: usize) -> String {
        format!("10.0.0.{index}")
    }

    /// `count` running fakes of one service on distinct hosts
    pub fn fleet(service: &str, count: usize) -> Vec<Arc<FakeRemoteProcess>> {
        (1..=count)
            .map(|i| Arc::new(FakeRemoteProcess::new(service, &Self::address(i))))
            .collect()
    }

    pub fn refs(fleet: &[Arc<FakeRemoteProcess>]) -> Vec<ProcessRef> {
        fleet.iter().map(|p| Arc::clone(p) as ProcessRef).collect()
    }
}

/// In-memory remote process
pub struct FakeRemoteProcess {
    name: String,
    address: String,
    running: AtomicBool,
    /// stop and kill have no effect
    stubborn: AtomicBool,
    unreachable: AtomicBool,
    restart_delay: Mutex<Duration>,
    calls: Mutex<Vec<String>>,
    restarts: AtomicUsize,
}

impl FakeRemoteProcess {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            running: AtomicBool::new(true),
            stubborn: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
            restart_delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn stopped(self) -> Self {
        self.running.store(false, Ordering::SeqCst);
        self
    }

    pub fn stubborn(self) -> Self {
        self.stubborn.store(true, Ordering::SeqCst);
        self
    }

    pub fn unreachable(self) -> Self {
        self.unreachable.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_restart_delay(self, delay: Duration) -> Self {
        *self.restart_delay.lock().unwrap() = delay;
        self
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) -> ChaosResult<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ChaosError::transport(
                &self.address,
                TransportErrorKind::Connection,
                "ssh: connect to host: Connection refused",
            ));
        }
        Ok(())
    }

    fn go_down(&self) {
        if !self.stubborn.load(Ordering::SeqCst) {
            self.running.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl RemoteProcess for FakeRemoteProcess {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn address(&self) -> String {
        self.address.clone()
    }

    fn pid_file(&self) -> String {
        format!("/var/run/{}.pid", self.name)
    }

    async fn execute(&self, command: &str) -> ChaosResult<i32> {
        self.record(command)?;
        Ok(0)
    }

    async fn is_running(&self) -> ChaosResult<bool> {
        self.record("is_running")?;
        Ok(self.running())
    }

    async fn stop(&self) -> ChaosResult<()> {
        self.record("stop")?;
        self.go_down();
        Ok(())
    }

    async fn kill(&self) -> ChaosResult<()> {
        self.record("kill")?;
        self.go_down();
        Ok(())
    }

    async fn restart(&self) -> ChaosResult<()> {
        self.record("restart")?;
        let delay = *self.restart_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.restarts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn start(&self) -> ChaosResult<()> {
        self.record("start")?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn terminate(&self) -> ChaosResult<()> {
        self.record("terminate")?;
        self.go_down();
        Ok(())
    }
}
