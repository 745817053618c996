use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use deploydag::exec::{BackendFuture, DeployRequest, DeploymentBackend};
use deploydag::types::AddressSource;

/// Scripted result for one contract.
#[derive(Debug, Clone)]
pub enum Script {
    DeployOk(Option<String>),
    DeployFails(String),
    ResolveOk(String),
    ResolveFails(String),
    Panics,
}

/// Which request a contract received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Deploy(String),
    Resolve(String),
}

/// Start/finish marks, in global order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Started(String),
    Finished(String),
}

/// A fake backend that:
/// - returns scripted results per contract (default: deploy ok, no address;
///   resolve returns a `Known` address or fails)
/// - optionally sleeps per contract to shape timing
/// - records calls, start/finish order and peak concurrency.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<Call>>,
    timeline: Mutex<Vec<Mark>>,
    seen_dependencies: Mutex<HashMap<String, BTreeMap<String, String>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub fn deploy_ok(self, name: &str, address: Option<&str>) -> Self {
        self.script(name, Script::DeployOk(address.map(str::to_string)))
    }

    pub fn deploy_fails(self, name: &str, message: &str) -> Self {
        self.script(name, Script::DeployFails(message.to_string()))
    }

    pub fn resolve_ok(self, name: &str, address: &str) -> Self {
        self.script(name, Script::ResolveOk(address.to_string()))
    }

    pub fn resolve_fails(self, name: &str, message: &str) -> Self {
        self.script(name, Script::ResolveFails(message.to_string()))
    }

    pub fn panics(self, name: &str) -> Self {
        self.script(name, Script::Panics)
    }

    pub fn delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn timeline(&self) -> Vec<Mark> {
        self.timeline.lock().unwrap().clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Dependency addresses the contract's request carried.
    pub fn dependencies_seen_by(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.seen_dependencies.lock().unwrap().get(name).cloned()
    }

    /// Position of a mark in the timeline.
    pub fn position(&self, mark: &Mark) -> Option<usize> {
        self.timeline().iter().position(|m| m == mark)
    }

    async fn enter(&self, request: &DeployRequest, call: Call) {
        let name = request.name().to_string();
        self.calls.lock().unwrap().push(call);
        self.seen_dependencies
            .lock()
            .unwrap()
            .insert(name.clone(), request.dependency_addresses.clone());
        self.timeline.lock().unwrap().push(Mark::Started(name.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        match self.delays.get(&name) {
            Some(delay) => tokio::time::sleep(*delay).await,
            None => tokio::task::yield_now().await,
        }
    }

    fn leave(&self, name: &str) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.timeline
            .lock()
            .unwrap()
            .push(Mark::Finished(name.to_string()));
    }
}

impl DeploymentBackend for ScriptedBackend {
    fn resolve_address<'a>(&'a self, request: &'a DeployRequest) -> BackendFuture<'a, String> {
        Box::pin(async move {
            let name = request.name().to_string();
            self.enter(request, Call::Resolve(name.clone())).await;
            let script = self.scripts.get(&name).cloned();
            self.leave(&name);

            match script {
                Some(Script::ResolveOk(address)) => Ok(address),
                Some(Script::ResolveFails(message)) => Err(anyhow!(message)),
                Some(Script::Panics) => panic!("scripted panic in {name}"),
                _ => match &request.contract.address_handler {
                    Some(AddressSource::Known(address)) => Ok(address.clone()),
                    _ => Err(anyhow!("no scripted address for {name}")),
                },
            }
        })
    }

    fn deploy<'a>(&'a self, request: &'a DeployRequest) -> BackendFuture<'a, Option<String>> {
        Box::pin(async move {
            let name = request.name().to_string();
            self.enter(request, Call::Deploy(name.clone())).await;
            let script = self.scripts.get(&name).cloned();
            self.leave(&name);

            match script {
                Some(Script::DeployOk(address)) => Ok(address),
                Some(Script::DeployFails(message)) => Err(anyhow!(message)),
                Some(Script::Panics) => panic!("scripted panic in {name}"),
                _ => Ok(None),
            }
        })
    }
}
