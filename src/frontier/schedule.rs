//! Politeness schedule
//!
//! Holds the per-domain FIFO queues and the min-heap of domains ordered by
//! the earliest instant each may be fetched again. Everything here is plain
//! data; the frontier wraps it in a mutex and a condvar.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// A domain waiting in the politeness heap
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    /// Earliest instant the domain may be fetched
    pub next_eligible: Instant,

    /// The politeness domain (`host[:port]`)
    pub domain: String,
}

// Reverse comparison so the earliest instant is popped first from BinaryHeap
impl Ord for ScheduleEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .next_eligible
            .cmp(&self.next_eligible)
            .then_with(|| other.domain.cmp(&self.domain))
    }
}

impl PartialOrd for ScheduleEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.next_eligible == other.next_eligible && self.domain == other.domain
    }
}

impl Eq for ScheduleEntry {}

/// Outcome of one pass over the heap
#[derive(Debug, PartialEq, Eq)]
pub enum Poll {
    /// A URL was handed out and its domain is now busy
    Ready(String),

    /// Nothing is eligible yet; wait until the deadline, or until notified
    Wait(Option<Instant>),

    /// No pending URLs and no domain in flight
    Exhausted,

    /// The frontier was halted
    Halted,
}

/// Scheduling state guarded by the frontier's scheduling lock
#[derive(Debug)]
pub struct Schedule {
    queues: HashMap<String, VecDeque<String>>,
    heap: BinaryHeap<ScheduleEntry>,
    in_heap: HashSet<String>,
    busy: HashSet<String>,
    last_access: HashMap<String, Instant>,
    delay: Duration,
    pending: usize,
    halted: bool,
}

impl Schedule {
    /// Creates an empty schedule with the given politeness delay
    pub fn new(delay: Duration) -> Self {
        Self {
            queues: HashMap::new(),
            heap: BinaryHeap::new(),
            in_heap: HashSet::new(),
            busy: HashSet::new(),
            last_access: HashMap::new(),
            delay,
            pending: 0,
            halted: false,
        }
    }

    /// Earliest instant `domain` may be fetched, if it was fetched before
    fn polite_time(&self, domain: &str) -> Option<Instant> {
        self.last_access.get(domain).map(|last| *last + self.delay)
    }

    /// Appends a URL to its domain queue
    ///
    /// The domain joins the heap unless it is already resident or currently
    /// leased; a leased domain is pushed back by [`Schedule::release`].
    pub fn enqueue(&mut self, domain: String, url: String, now: Instant) {
        self.queues.entry(domain.clone()).or_default().push_back(url);
        self.pending += 1;

        if !self.in_heap.contains(&domain) && !self.busy.contains(&domain) {
            let next_eligible = self.polite_time(&domain).unwrap_or(now);
            self.in_heap.insert(domain.clone());
            self.heap.push(ScheduleEntry {
                next_eligible,
                domain,
            });
        }
    }

    /// Looks for a URL whose domain is idle and past its politeness delay
    ///
    /// Stale entries (empty queues) are dropped, busy domains are set aside
    /// and restored after the scan, and entries older than the domain's last
    /// access are pushed back with a corrected time.
    pub fn poll(&mut self, now: Instant) -> Poll {
        if self.halted {
            return Poll::Halted;
        }

        let mut set_aside = Vec::new();
        let mut deadline = None;
        let mut taken = None;

        while let Some(entry) = self.heap.pop() {
            let has_work = self
                .queues
                .get(&entry.domain)
                .map_or(false, |queue| !queue.is_empty());
            if !has_work {
                self.in_heap.remove(&entry.domain);
                continue;
            }

            if self.busy.contains(&entry.domain) {
                set_aside.push(entry);
                continue;
            }

            if let Some(polite) = self.polite_time(&entry.domain) {
                if entry.next_eligible < polite {
                    self.heap.push(ScheduleEntry {
                        next_eligible: polite,
                        domain: entry.domain,
                    });
                    continue;
                }
            }

            if now < entry.next_eligible {
                deadline = Some(entry.next_eligible);
                self.heap.push(entry);
                break;
            }

            taken = Some(entry);
            break;
        }

        self.heap.extend(set_aside);

        if let Some(entry) = taken {
            if let Some(url) = self.take_head(entry) {
                return Poll::Ready(url);
            }
        }

        if self.is_exhausted() {
            Poll::Exhausted
        } else {
            Poll::Wait(deadline)
        }
    }

    fn take_head(&mut self, entry: ScheduleEntry) -> Option<String> {
        let queue = self.queues.get_mut(&entry.domain)?;
        let url = queue.pop_front()?;
        self.pending -= 1;
        self.busy.insert(entry.domain.clone());

        if queue.is_empty() {
            self.queues.remove(&entry.domain);
            self.in_heap.remove(&entry.domain);
        } else {
            self.heap.push(entry);
        }
        Some(url)
    }

    /// Releases a leased domain and starts its politeness delay
    pub fn release(&mut self, domain: &str, now: Instant) {
        self.last_access.insert(domain.to_string(), now);
        self.busy.remove(domain);

        let has_work = self
            .queues
            .get(domain)
            .map_or(false, |queue| !queue.is_empty());
        if has_work && !self.in_heap.contains(domain) {
            self.in_heap.insert(domain.to_string());
            self.heap.push(ScheduleEntry {
                next_eligible: now + self.delay,
                domain: domain.to_string(),
            });
        }
    }

    /// Latches the halt flag
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// True when nothing is queued and no domain is leased
    pub fn is_exhausted(&self) -> bool {
        self.pending == 0 && self.busy.is_empty()
    }

    /// Number of queued URLs
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Number of domains with queued URLs
    pub fn domain_count(&self) -> usize {
        self.queues.len()
    }

    /// Number of domains currently leased to workers
    pub fn busy_count(&self) -> usize {
        self.busy.len()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    fn url(domain: &str, path: &str) -> String {
        format!("https://{}/{}", domain, path)
    }

    #[test]
    fn test_entry_ordering_earliest_first() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(ScheduleEntry {
            next_eligible: now + Duration::from_secs(2),
            domain: "late.example".to_string(),
        });
        heap.push(ScheduleEntry {
            next_eligible: now,
            domain: "early.example".to_string(),
        });

        assert_eq!(heap.pop().unwrap().domain, "early.example");
        assert_eq!(heap.pop().unwrap().domain, "late.example");
    }

    #[test]
    fn test_empty_schedule_is_exhausted() {
        let mut schedule = Schedule::new(DELAY);
        assert_eq!(schedule.poll(Instant::now()), Poll::Exhausted);
    }

    #[test]
    fn test_fifo_within_domain() {
        let mut schedule = Schedule::new(Duration::ZERO);
        let now = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), now);
        schedule.enqueue("a".to_string(), url("a", "2"), now);

        assert_eq!(schedule.poll(now), Poll::Ready(url("a", "1")));
        schedule.release("a", now);
        assert_eq!(schedule.poll(now), Poll::Ready(url("a", "2")));
    }

    #[test]
    fn test_busy_domain_is_skipped() {
        let mut schedule = Schedule::new(Duration::ZERO);
        let now = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), now);
        schedule.enqueue("a".to_string(), url("a", "2"), now);
        schedule.enqueue("b".to_string(), url("b", "1"), now);

        // Equal times tie-break on domain name
        assert_eq!(schedule.poll(now), Poll::Ready(url("a", "1")));
        assert_eq!(schedule.poll(now), Poll::Ready(url("b", "1")));

        // Both domains are leased; the remaining URL has to wait
        assert_eq!(schedule.poll(now), Poll::Wait(None));
        assert_eq!(schedule.busy_count(), 2);
    }

    #[test]
    fn test_release_starts_delay() {
        let mut schedule = Schedule::new(DELAY);
        let start = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), start);
        schedule.enqueue("a".to_string(), url("a", "2"), start);

        assert_eq!(schedule.poll(start), Poll::Ready(url("a", "1")));
        schedule.release("a", start);

        assert_eq!(schedule.poll(start), Poll::Wait(Some(start + DELAY)));
        assert_eq!(
            schedule.poll(start + DELAY),
            Poll::Ready(url("a", "2"))
        );
    }

    #[test]
    fn test_enqueue_after_release_respects_delay() {
        let mut schedule = Schedule::new(DELAY);
        let start = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), start);
        assert_eq!(schedule.poll(start), Poll::Ready(url("a", "1")));
        schedule.release("a", start);

        // Domain left the heap when its queue drained; re-entering must not skip the delay
        schedule.enqueue("a".to_string(), url("a", "2"), start);
        assert_eq!(schedule.poll(start), Poll::Wait(Some(start + DELAY)));
    }

    #[test]
    fn test_stale_resident_entry_is_corrected() {
        let mut schedule = Schedule::new(DELAY);
        let start = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), start);
        schedule.enqueue("a".to_string(), url("a", "2"), start);

        // The entry is re-pushed with its old time while the domain is leased
        assert_eq!(schedule.poll(start), Poll::Ready(url("a", "1")));
        let released = start + Duration::from_millis(30);
        schedule.release("a", released);

        assert_eq!(schedule.poll(released), Poll::Wait(Some(released + DELAY)));
    }

    #[test]
    fn test_exhaustion_waits_for_busy_domains() {
        let mut schedule = Schedule::new(Duration::ZERO);
        let now = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), now);
        assert_eq!(schedule.poll(now), Poll::Ready(url("a", "1")));

        // The leased page may still discover new links
        assert_eq!(schedule.poll(now), Poll::Wait(None));
        assert!(!schedule.is_exhausted());

        schedule.release("a", now);
        assert_eq!(schedule.poll(now), Poll::Exhausted);
        assert_eq!(schedule.poll(now), Poll::Exhausted);
    }

    #[test]
    fn test_halt_wins() {
        let mut schedule = Schedule::new(Duration::ZERO);
        let now = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), now);
        schedule.halt();
        assert!(schedule.is_halted());
        assert_eq!(schedule.poll(now), Poll::Halted);
        assert_eq!(schedule.pending_count(), 1);
    }

    #[test]
    fn test_counts() {
        let mut schedule = Schedule::new(DELAY);
        let now = Instant::now();
        schedule.enqueue("a".to_string(), url("a", "1"), now);
        schedule.enqueue("a".to_string(), url("a", "2"), now);
        schedule.enqueue("b".to_string(), url("b", "1"), now);

        assert_eq!(schedule.pending_count(), 3);
        assert_eq!(schedule.domain_count(), 2);
        assert_eq!(schedule.delay(), DELAY);
    }
}
