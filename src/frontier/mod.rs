//! Concurrent crawl frontier
//!
//! The frontier owns every URL the crawl knows about:
//! - the durable record store, which answers "have we seen this URL?"
//! - per-domain FIFO queues of URLs still to be fetched
//! - the politeness heap that decides which domain may be fetched next
//!
//! Two locks guard it. The store lock serializes record-store access so that
//! a check-then-insert on one key is atomic. The scheduling lock guards the
//! queues and the heap, and its condvar wakes workers blocked in
//! [`Frontier::get_tbd_url`].

mod recovery;
mod schedule;

pub use recovery::RecoveryReport;
pub use schedule::{Poll, Schedule, ScheduleEntry};

use crate::storage::RecordStore;
use crate::url::{extract_domain, normalize_url, url_key};
use crate::Result;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Shared crawl frontier
///
/// All methods take `&self`; share the frontier between worker threads with
/// an `Arc`.
pub struct Frontier {
    store: Mutex<Box<dyn RecordStore>>,
    schedule: Mutex<Schedule>,
    ready: Condvar,
}

impl Frontier {
    /// Creates a frontier over an already-open record store
    ///
    /// Nothing is loaded from the store; see [`Frontier::recover`] for resuming.
    ///
    /// # Arguments
    ///
    /// * `store` - The durable record store
    /// * `delay` - Minimum gap between two fetches to the same domain
    pub fn new(store: Box<dyn RecordStore>, delay: Duration) -> Self {
        Self {
            store: Mutex::new(store),
            schedule: Mutex::new(Schedule::new(delay)),
            ready: Condvar::new(),
        }
    }

    /// Adds a discovered URL
    ///
    /// The URL is normalized and keyed. If the key is new, the record is
    /// written and flushed before the store lock is released, then the URL is
    /// queued behind its domain.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The URL was new and has been queued
    /// * `Ok(false)` - The URL was already known, or could not be normalized
    /// * `Err(SieveError)` - The record store failed
    pub fn add_url(&self, url: &str) -> Result<bool> {
        let normalized = match normalize_url(url) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::debug!("Ignoring {}: {}", url, e);
                return Ok(false);
            }
        };
        let Some(domain) = extract_domain(&normalized) else {
            tracing::debug!("Ignoring {}: no host", url);
            return Ok(false);
        };
        let key = url_key(&normalized);
        let url = normalized.to_string();

        {
            let mut store = self.store.lock();
            if store.contains(&key)? {
                return Ok(false);
            }
            store.upsert(&key, &url, &domain, false)?;
            store.flush()?;
        }

        tracing::trace!("Queued {} for {}", url, domain);
        self.enqueue(domain, url);
        Ok(true)
    }

    /// Queues a URL without touching the record store
    fn enqueue(&self, domain: String, url: String) {
        let mut schedule = self.schedule.lock();
        schedule.enqueue(domain, url, Instant::now());
        self.ready.notify_all();
    }

    /// Hands out the next URL that may be fetched politely
    ///
    /// Blocks while every pending URL belongs to a busy domain or to a domain
    /// still inside its politeness delay. The caller owns the URL's domain
    /// until it calls [`Frontier::mark_domain_done`].
    ///
    /// # Returns
    ///
    /// * `Some(String)` - A normalized URL to fetch
    /// * `None` - The frontier is exhausted or halted
    pub fn get_tbd_url(&self) -> Option<String> {
        let mut schedule = self.schedule.lock();
        loop {
            match schedule.poll(Instant::now()) {
                Poll::Ready(url) => return Some(url),
                Poll::Exhausted | Poll::Halted => {
                    self.ready.notify_all();
                    return None;
                }
                Poll::Wait(Some(deadline)) => {
                    tracing::trace!("No domain ready, waiting until next deadline");
                    self.ready.wait_until(&mut schedule, deadline);
                }
                Poll::Wait(None) => {
                    self.ready.wait(&mut schedule);
                }
            }
        }
    }

    /// Releases a domain leased by [`Frontier::get_tbd_url`]
    ///
    /// The domain's politeness delay starts now.
    pub fn mark_domain_done(&self, domain: &str) {
        let mut schedule = self.schedule.lock();
        schedule.release(domain, Instant::now());
        self.ready.notify_all();
    }

    /// Durably records that a URL has been fetched
    ///
    /// A URL that was never added is logged as an error and otherwise ignored.
    pub fn mark_url_complete(&self, url: &str) -> Result<()> {
        let key = match normalize_url(url) {
            Ok(normalized) => url_key(&normalized),
            Err(e) => {
                tracing::error!("Completed url {} cannot be normalized: {}", url, e);
                return Ok(());
            }
        };

        let mut store = self.store.lock();
        if !store.set_completed(&key)? {
            tracing::error!("Completed url {}, but have not seen it before", url);
            return Ok(());
        }
        store.flush()?;
        Ok(())
    }

    /// Stops the frontier; blocked and future dequeues return `None`
    pub fn halt(&self) {
        let mut schedule = self.schedule.lock();
        if !schedule.is_halted() {
            tracing::info!("Frontier halted");
        }
        schedule.halt();
        self.ready.notify_all();
    }

    pub fn is_halted(&self) -> bool {
        self.schedule.lock().is_halted()
    }

    /// Number of URLs waiting in domain queues
    pub fn pending_count(&self) -> usize {
        self.schedule.lock().pending_count()
    }

    /// Number of domains with waiting URLs
    pub fn domain_count(&self) -> usize {
        self.schedule.lock().domain_count()
    }

    /// True when no URL is queued and no domain is leased
    pub fn is_exhausted(&self) -> bool {
        self.schedule.lock().is_exhausted()
    }

    pub fn politeness_delay(&self) -> Duration {
        self.schedule.lock().delay()
    }

    /// Compacts the record store once workers have stopped
    pub fn checkpoint(&self) -> Result<()> {
        Ok(self.store.lock().checkpoint()?)
    }

    /// Total records in the store
    pub fn record_count(&self) -> Result<u64> {
        Ok(self.store.lock().count()?)
    }

    /// Records already fetched
    pub fn completed_count(&self) -> Result<u64> {
        Ok(self.store.lock().count_completed(true)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteRecordStore;
    use crate::url::domain_of;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn frontier(delay: Duration) -> Frontier {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        Frontier::new(Box::new(store), delay)
    }

    #[test]
    fn test_add_url_is_idempotent() {
        let frontier = frontier(Duration::ZERO);

        assert!(frontier.add_url("https://www.ics.uci.edu/about").unwrap());
        assert!(!frontier.add_url("https://www.ics.uci.edu/about").unwrap());
        assert!(!frontier.add_url("https://WWW.ICS.UCI.EDU/about/#team").unwrap());

        assert_eq!(frontier.pending_count(), 1);
        assert_eq!(frontier.record_count().unwrap(), 1);
    }

    #[test]
    fn test_add_url_ignores_garbage() {
        let frontier = frontier(Duration::ZERO);
        assert!(!frontier.add_url("not a url").unwrap());
        assert!(!frontier.add_url("mailto:someone@uci.edu").unwrap());
        assert_eq!(frontier.record_count().unwrap(), 0);
    }

    #[test]
    fn test_concurrent_add_of_same_url_queues_once() {
        let frontier = Arc::new(frontier(Duration::ZERO));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    frontier.add_url("https://www.ics.uci.edu/about").unwrap()
                })
            })
            .collect();

        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&added| added)
            .count();

        assert_eq!(added, 1);
        assert_eq!(frontier.pending_count(), 1);
        assert_eq!(frontier.record_count().unwrap(), 1);
    }

    #[test]
    fn test_get_on_empty_frontier_returns_none() {
        let frontier = frontier(Duration::ZERO);
        assert!(frontier.get_tbd_url().is_none());
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_exhaustion_is_terminal() {
        let frontier = frontier(Duration::ZERO);
        frontier.add_url("https://a.ics.uci.edu/").unwrap();

        let url = frontier.get_tbd_url().unwrap();
        frontier.mark_url_complete(&url).unwrap();
        frontier.mark_domain_done("a.ics.uci.edu");

        assert!(frontier.get_tbd_url().is_none());
        assert!(frontier.get_tbd_url().is_none());
        assert_eq!(frontier.completed_count().unwrap(), 1);
    }

    #[test]
    fn test_busy_domain_is_not_handed_out_twice() {
        let frontier = frontier(Duration::ZERO);
        frontier.add_url("https://a.ics.uci.edu/1").unwrap();
        frontier.add_url("https://a.ics.uci.edu/2").unwrap();
        frontier.add_url("https://b.ics.uci.edu/1").unwrap();

        let first = frontier.get_tbd_url().unwrap();
        let second = frontier.get_tbd_url().unwrap();
        assert_ne!(domain_of(&first), domain_of(&second));
        assert_eq!(frontier.pending_count(), 1);
    }

    #[test]
    fn test_politeness_gap_measured_from_release() {
        let delay = Duration::from_millis(80);
        let frontier = frontier(delay);
        frontier.add_url("https://a.ics.uci.edu/1").unwrap();
        frontier.add_url("https://a.ics.uci.edu/2").unwrap();

        frontier.get_tbd_url().unwrap();
        thread::sleep(Duration::from_millis(30));
        let before_release = Instant::now();
        frontier.mark_domain_done("a.ics.uci.edu");

        frontier.get_tbd_url().unwrap();
        assert!(before_release.elapsed() >= delay);
    }

    #[test]
    fn test_unknown_completion_is_not_an_error() {
        let frontier = frontier(Duration::ZERO);
        assert!(frontier.mark_url_complete("https://a.ics.uci.edu/never").is_ok());
        assert_eq!(frontier.record_count().unwrap(), 0);
    }

    #[test]
    fn test_halt_wakes_blocked_worker() {
        let frontier = Arc::new(frontier(Duration::ZERO));
        frontier.add_url("https://a.ics.uci.edu/1").unwrap();
        frontier.add_url("https://a.ics.uci.edu/2").unwrap();
        frontier.get_tbd_url().unwrap();

        let blocked = {
            let frontier = Arc::clone(&frontier);
            thread::spawn(move || frontier.get_tbd_url())
        };
        thread::sleep(Duration::from_millis(50));
        frontier.halt();

        assert!(blocked.join().unwrap().is_none());
        assert!(frontier.get_tbd_url().is_none());
        assert!(frontier.is_halted());
    }

    #[test]
    fn test_release_wakes_waiting_worker() {
        let frontier = Arc::new(frontier(Duration::ZERO));
        frontier.add_url("https://a.ics.uci.edu/1").unwrap();
        frontier.get_tbd_url().unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            thread::spawn(move || frontier.get_tbd_url())
        };
        thread::sleep(Duration::from_millis(20));

        // Work discovered by the leased page is handed to the waiting worker
        frontier.add_url("https://a.ics.uci.edu/2").unwrap();
        frontier.mark_domain_done("a.ics.uci.edu");

        assert_eq!(
            waiter.join().unwrap().as_deref(),
            Some("https://a.ics.uci.edu/2")
        );
    }

    #[test]
    fn test_no_double_dequeue_across_threads() {
        let frontier = Arc::new(frontier(Duration::ZERO));
        for domain in ["a", "b", "c", "d"] {
            for page in 0..25 {
                frontier
                    .add_url(&format!("https://{}.ics.uci.edu/{}", domain, page))
                    .unwrap();
            }
        }

        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                let in_flight = Arc::clone(&in_flight);
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    while let Some(url) = frontier.get_tbd_url() {
                        let domain = domain_of(&url).unwrap();
                        assert!(in_flight.lock().insert(domain.clone()), "domain leased twice");
                        seen.lock().push(url.clone());
                        frontier.mark_url_complete(&url).unwrap();
                        in_flight.lock().remove(&domain);
                        frontier.mark_domain_done(&domain);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let seen = seen.lock();
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(seen.len(), 100);
        assert_eq!(unique.len(), 100);
        assert_eq!(frontier.completed_count().unwrap(), 100);
    }
}
