//! Duplicate detection fingerprints and the index that remembers them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::record::FinancialRecord;

/// SHA-256 over the normalized vendor, date and total of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a record.
    ///
    /// Vendor is lowercased with whitespace collapsed, the date is ISO
    /// formatted and the total is rounded to two decimals. Missing
    /// components hash as empty strings.
    pub fn of(record: &FinancialRecord) -> Self {
        let vendor = record
            .vendor
            .as_deref()
            .map(normalize_vendor)
            .unwrap_or_default();
        let date = record
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let total = record.total.map(format_total).unwrap_or_default();

        let raw = format!("{}|{}|{}", vendor, date, total);
        Self(Sha256::digest(raw.as_bytes()).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn normalize_vendor(vendor: &str) -> String {
    vendor
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn format_total(total: Decimal) -> String {
    format!(
        "{:.2}",
        total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// One indexed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintEntry {
    pub fingerprint: Fingerprint,
    pub vendor: Option<String>,
    pub date: Option<NaiveDate>,
    pub total: Option<Decimal>,
    pub seen_at: DateTime<Utc>,
}

impl FingerprintEntry {
    pub fn new(record: &FinancialRecord, seen_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint: Fingerprint::of(record),
            vendor: record.vendor.clone(),
            date: record.date,
            total: record.total,
            seen_at,
        }
    }
}

/// Lookup of previously seen documents.
///
/// Implementations are shared between concurrently processed documents.
pub trait FingerprintIndex: Send + Sync {
    /// Most recent entry for a fingerprint.
    fn lookup(&self, fingerprint: &Fingerprint) -> Option<FingerprintEntry>;

    /// Store an entry, replacing any entry with the same fingerprint.
    fn insert(&self, entry: FingerprintEntry);

    /// Look up the entry's fingerprint, then insert the entry, returning the
    /// prior entry.
    ///
    /// The default is not atomic; shared implementations must override it
    /// so that two concurrent duplicates cannot both miss each other.
    fn observe(&self, entry: FingerprintEntry) -> Option<FingerprintEntry> {
        let prior = self.lookup(&entry.fingerprint);
        self.insert(entry);
        prior
    }

    /// Number of distinct fingerprints held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct IndexState {
    entries: HashMap<Fingerprint, FingerprintEntry>,
    // Insertion order for eviction, oldest first.
    order: VecDeque<Fingerprint>,
}

/// Process-lifetime fingerprint index behind a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryFingerprintIndex {
    state: Mutex<IndexState>,
    capacity: Option<usize>,
}

impl InMemoryFingerprintIndex {
    /// Create an unbounded index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index holding at most `capacity` fingerprints; the oldest
    /// is evicted first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::default(),
            capacity: Some(capacity.max(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        // Every mutation leaves the state consistent, so a poisoned lock is safe to reuse.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_locked(&self, state: &mut IndexState, entry: FingerprintEntry) {
        let fingerprint = entry.fingerprint;
        if state.entries.insert(fingerprint, entry).is_some() {
            state.order.retain(|f| *f != fingerprint);
        }
        state.order.push_back(fingerprint);

        if let Some(capacity) = self.capacity {
            while state.entries.len() > capacity {
                let Some(oldest) = state.order.pop_front() else {
                    break;
                };
                state.entries.remove(&oldest);
            }
        }
    }
}

impl FingerprintIndex for InMemoryFingerprintIndex {
    fn lookup(&self, fingerprint: &Fingerprint) -> Option<FingerprintEntry> {
        self.lock().entries.get(fingerprint).cloned()
    }

    fn insert(&self, entry: FingerprintEntry) {
        let mut state = self.lock();
        self.insert_locked(&mut state, entry);
    }

    fn observe(&self, entry: FingerprintEntry) -> Option<FingerprintEntry> {
        let mut state = self.lock();
        let prior = state.entries.get(&entry.fingerprint).cloned();
        self.insert_locked(&mut state, entry);
        prior
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::thread;

    fn record(vendor: &str, total: &str) -> FinancialRecord {
        let mut record = FinancialRecord::default();
        record.vendor = Some(vendor.to_string());
        record.date = NaiveDate::from_ymd_opt(2025, 2, 3);
        record.total = Some(Decimal::from_str(total).unwrap());
        record
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_fingerprint_normalizes_vendor_and_total() {
        assert_eq!(
            Fingerprint::of(&record("  ACME   Corp ", "1100")),
            Fingerprint::of(&record("acme corp", "1100.00"))
        );
        assert_eq!(
            Fingerprint::of(&record("Acme", "10.005")),
            Fingerprint::of(&record("Acme", "10.01"))
        );
        assert_ne!(
            Fingerprint::of(&record("Acme", "10.00")),
            Fingerprint::of(&record("Acme", "10.01"))
        );
    }

    #[test]
    fn test_fingerprint_displays_as_hex() {
        let hex = Fingerprint::of(&record("Acme", "1.00")).to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_observe_returns_prior_and_keeps_latest() {
        let index = InMemoryFingerprintIndex::new();
        let first = FingerprintEntry::new(&record("Acme", "5.00"), at(100));
        let second = FingerprintEntry::new(&record("Acme", "5.00"), at(200));

        assert_eq!(index.observe(first.clone()), None);
        assert_eq!(index.observe(second.clone()), Some(first));
        assert_eq!(index.lookup(&second.fingerprint), Some(second));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let index = InMemoryFingerprintIndex::with_capacity(2);
        let a = FingerprintEntry::new(&record("A co", "1.00"), at(1));
        let b = FingerprintEntry::new(&record("B co", "1.00"), at(2));
        let c = FingerprintEntry::new(&record("C co", "1.00"), at(3));

        index.insert(a.clone());
        index.insert(b.clone());
        index.insert(c.clone());

        assert_eq!(index.len(), 2);
        assert!(index.lookup(&a.fingerprint).is_none());
        assert!(index.lookup(&b.fingerprint).is_some());
        assert!(index.lookup(&c.fingerprint).is_some());
    }

    #[test]
    fn test_concurrent_duplicates_are_seen_once() {
        let index = Arc::new(InMemoryFingerprintIndex::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    index
                        .observe(FingerprintEntry::new(&record("Acme", "9.99"), at(i)))
                        .is_some()
                })
            })
            .collect();

        let duplicates = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|seen| *seen)
            .count();
        assert_eq!(duplicates, 7);
        assert_eq!(index.len(), 1);
    }
}
