use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Highest aggression level handed to templates.
pub const MAX_AGGRESSION: u64 = 20;

/// Distinct keys kept per table before the least active ones are evicted.
pub const DEFAULT_CAPACITY: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpEntry {
	pub ip: String,
	pub queries: u64,
	pub aggression: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgentEntry {
	pub user_agent: String,
	pub queries: u64,
	pub aggression: u64,
}

/// Per-client query counters, keyed separately by IP and by User-Agent.
///
/// A client that rotates one of the two keys is still tracked by the
/// other, so its aggression level keeps growing. Each table holds at most
/// `capacity` keys: when a new key arrives at a full table, every key with
/// the lowest count is dropped.
#[derive(Debug)]
pub struct ClientLedger {
	capacity: usize,
	total: AtomicU64,
	by_ip: Mutex<HashMap<String, u64>>,
	by_user_agent: Mutex<HashMap<String, u64>>,
}

impl Default for ClientLedger {
	fn default() -> Self {
		Self::with_capacity(DEFAULT_CAPACITY)
	}
}

fn level(queries: u64, queries_per_aggression: u64) -> u64 {
	(queries / queries_per_aggression.max(1)).min(MAX_AGGRESSION)
}

fn bump(counters: &Mutex<HashMap<String, u64>>, key: &str, capacity: usize) -> u64 {
	let mut counters = counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
	if counters.len() >= capacity && !counters.contains_key(key) {
		if let Some(lowest) = counters.values().copied().min() {
			counters.retain(|_, count| *count > lowest);
			log::debug!("Ledger full, evicted keys with {lowest} queries");
		}
	}
	let count = counters.entry(key.to_owned()).or_insert(0);
	*count += 1;
	*count
}

fn snapshot(counters: &Mutex<HashMap<String, u64>>) -> Vec<(String, u64)> {
	let counters = counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
	let mut entries: Vec<(String, u64)> =
		counters.iter().map(|(key, count)| (key.clone(), *count)).collect();
	entries.sort();
	entries
}

impl ClientLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			capacity: capacity.max(1),
			total: AtomicU64::new(0),
			by_ip: Mutex::default(),
			by_user_agent: Mutex::default(),
		}
	}

	/// Counts one query and returns the client's aggression level.
	///
	/// The level is `queries / queries_per_aggression`, taken as the larger
	/// of the IP and User-Agent levels and capped at [`MAX_AGGRESSION`].
	pub fn record(&self, ip: &str, user_agent: &str, queries_per_aggression: u64) -> u64 {
		self.total.fetch_add(1, Ordering::Relaxed);
		let ip_queries = bump(&self.by_ip, ip, self.capacity);
		let ua_queries = bump(&self.by_user_agent, user_agent, self.capacity);
		level(ip_queries, queries_per_aggression).max(level(ua_queries, queries_per_aggression))
	}

	pub fn ip_entries(&self, queries_per_aggression: u64) -> Vec<IpEntry> {
		snapshot(&self.by_ip)
			.into_iter()
			.map(|(ip, queries)| IpEntry { ip, queries, aggression: level(queries, queries_per_aggression) })
			.collect()
	}

	pub fn user_agent_entries(&self, queries_per_aggression: u64) -> Vec<UserAgentEntry> {
		snapshot(&self.by_user_agent)
			.into_iter()
			.map(|(user_agent, queries)| UserAgentEntry {
				user_agent,
				queries,
				aggression: level(queries, queries_per_aggression),
			})
			.collect()
	}

	/// Every query ever recorded, including those of evicted keys.
	pub fn total_queries(&self) -> u64 {
		self.total.load(Ordering::Relaxed)
	}
}
