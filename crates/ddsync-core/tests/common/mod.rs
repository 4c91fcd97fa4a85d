//! Test doubles and common utilities for engine contract tests
//!
//! Every double keeps its counters behind `Arc`s so a test can hand one
//! instance to the engine and keep a twin (see `sharing_counters_with`) to
//! inspect afterwards.

#![allow(dead_code)]

use ddsync_core::error::{Error, Result};
use ddsync_core::response::{self, UpdateOutcome};
use ddsync_core::traits::{HostLookup, PublicIpSource, UpdateClient};
use ddsync_core::SyncConfig;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted answer for a public-IP fetch or host lookup
pub type Answer<T> = std::result::Result<T, String>;

/// Public IP source that replays scripted answers
///
/// Once the script runs out, the fallback answer repeats forever.
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<Answer<Ipv4Addr>>>>,
    fallback: Answer<Ipv4Addr>,
    delay: Option<Duration>,
    fetch_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    /// Always answer with `ip`
    pub fn fixed(ip: Ipv4Addr) -> Self {
        Self::scripted(Vec::new(), Ok(ip))
    }

    /// Always fail
    pub fn failing(message: &str) -> Self {
        Self::scripted(Vec::new(), Err(message.to_string()))
    }

    pub fn scripted(script: Vec<Answer<Ipv4Addr>>, fallback: Answer<Ipv4Addr>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            delay: None,
            fetch_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping fetches observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: other.script.clone(),
            fallback: other.fallback.clone(),
            delay: other.delay,
            fetch_count: other.fetch_count.clone(),
            in_flight: other.in_flight.clone(),
            max_in_flight: other.max_in_flight.clone(),
        }
    }
}

#[async_trait::async_trait]
impl PublicIpSource for ScriptedIpSource {
    async fn fetch(&self) -> Result<Ipv4Addr> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer.map_err(Error::network)
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Host lookup that replays scripted answers
pub struct ScriptedLookup {
    script: Arc<Mutex<VecDeque<Answer<Vec<Ipv4Addr>>>>>,
    fallback: Answer<Vec<Ipv4Addr>>,
    lookup_count: Arc<AtomicUsize>,
}

impl ScriptedLookup {
    /// Always answer with a single address
    pub fn fixed(ip: Ipv4Addr) -> Self {
        Self::scripted(Vec::new(), Ok(vec![ip]))
    }

    /// Always fail
    pub fn failing(message: &str) -> Self {
        Self::scripted(Vec::new(), Err(message.to_string()))
    }

    pub fn scripted(script: Vec<Answer<Vec<Ipv4Addr>>>, fallback: Answer<Vec<Ipv4Addr>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            lookup_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: other.script.clone(),
            fallback: other.fallback.clone(),
            lookup_count: other.lookup_count.clone(),
        }
    }
}

#[async_trait::async_trait]
impl HostLookup for ScriptedLookup {
    async fn lookup_ipv4(&self, hostname: &str) -> Result<Vec<Ipv4Addr>> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);

        let answer = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        answer.map_err(|message| Error::dns_resolution(hostname, message))
    }
}

/// Update client that records every call and answers with a fixed body
pub struct RecordingUpdateClient {
    body: Arc<Mutex<String>>,
    updates: Arc<Mutex<Vec<Ipv4Addr>>>,
}

impl RecordingUpdateClient {
    /// Answer every update with `body` (e.g. `"good 5.6.7.8"`)
    pub fn answering(body: &str) -> Self {
        Self {
            body: Arc::new(Mutex::new(body.to_string())),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change the response for subsequent updates
    pub fn set_body(&self, body: &str) {
        *self.body.lock().unwrap() = body.to_string();
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Addresses passed to `update`, in call order
    pub fn updated_ips(&self) -> Vec<Ipv4Addr> {
        self.updates.lock().unwrap().clone()
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            body: other.body.clone(),
            updates: other.updates.clone(),
        }
    }
}

#[async_trait::async_trait]
impl UpdateClient for RecordingUpdateClient {
    async fn update(&self, ip: Ipv4Addr) -> Result<UpdateOutcome> {
        self.updates.lock().unwrap().push(ip);
        let body = self.body.lock().unwrap().clone();
        Ok(response::parse(&body))
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Create a minimal valid configuration
pub fn minimal_config(hostname: &str) -> SyncConfig {
    SyncConfig::new(hostname, "user", "secret")
}

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}
