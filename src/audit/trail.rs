//! Audit Ring Buffer
//!
//! Fixed-capacity, append-only record of security decisions.
//!
//! # Design
//! - Storage is a static array of `AUDIT_CAPACITY` records
//! - `write_index` counts every record ever written (never wraps back)
//! - Slot for the next record is `write_index % capacity`
//! - The valid window is the last `min(write_index, capacity)` records
//!
//! # Concurrency
//! The ring is protected by a spinlock held only for one array write or
//! one record copy. The clock is read before the lock is taken and sink
//! output happens after it is dropped, so neither collaborator can stall
//! `record`. `drain` copies one record at a time, so no caller needs the
//! whole window on its stack.

use spin::Mutex;

use super::record::{AuditKind, AuditObject, AuditRecord};
use crate::console::{Clock, LogSink};
use crate::sink_line;
use crate::task::{Pid, Uid};

/// Compile-time capacity of the ring.
pub const AUDIT_CAPACITY: usize = 128;

/// Ring state behind the lock.
struct TrailInner {
    /// Record storage.
    buffer: [AuditRecord; AUDIT_CAPACITY],
    /// Total records written since the last reset.
    write_index: u64,
    /// Timestamp of the newest record.
    last_stamp: u64,
}

impl TrailInner {
    const fn new() -> Self {
        const EMPTY: AuditRecord = AuditRecord::empty();
        Self {
            buffer: [EMPTY; AUDIT_CAPACITY],
            write_index: 0,
            last_stamp: 0,
        }
    }

    /// Sequence number of the oldest record still in the window.
    fn first_seq(&self, capacity: usize) -> u64 {
        self.write_index - self.valid_len(capacity) as u64
    }

    fn valid_len(&self, capacity: usize) -> usize {
        if self.write_index < capacity as u64 {
            self.write_index as usize
        } else {
            capacity
        }
    }
}

/// Process-wide audit trail.
pub struct AuditTrail<'a> {
    inner: Mutex<TrailInner>,
    /// Effective capacity, at most `AUDIT_CAPACITY`.
    capacity: usize,
    clock: &'a dyn Clock,
}

impl<'a> AuditTrail<'a> {
    /// Create an empty trail.
    ///
    /// `capacity` is clamped to `1..=AUDIT_CAPACITY`.
    pub fn new(capacity: usize, clock: &'a dyn Clock) -> Self {
        Self {
            inner: Mutex::new(TrailInner::new()),
            capacity: capacity.clamp(1, AUDIT_CAPACITY),
            clock,
        }
    }

    /// Reset the write index.
    ///
    /// Old record memory is left in place; it falls outside the valid
    /// window and is never exposed.
    pub fn init(&self) {
        {
            let mut inner = self.inner.lock();
            inner.write_index = 0;
            inner.last_stamp = 0;
        }
        log::info!(target: "audit", "[audit] Initialized audit subsystem (capacity {})", self.capacity);
    }

    /// Append one record.
    ///
    /// Never fails and never blocks on I/O. Once the ring is full the
    /// oldest record is overwritten.
    pub fn record(
        &self,
        kind: AuditKind,
        message: Option<&'static str>,
        uid: Uid,
        pid: Pid,
        object: AuditObject,
    ) {
        let rec = self.append(kind, message, uid, pid, object);
        log::debug!(
            target: "audit",
            "type={} pid={} uid={} msg={}",
            rec.kind(),
            rec.pid(),
            rec.uid(),
            rec.message()
        );
    }

    /// Append without logging. Safe to call with another component's lock
    /// held: it touches nothing but the clock and the ring.
    pub(crate) fn append(
        &self,
        kind: AuditKind,
        message: Option<&'static str>,
        uid: Uid,
        pid: Pid,
        object: AuditObject,
    ) -> AuditRecord {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        // Two writers may read the clock in one order and lock in the other;
        // clamping keeps stamps non-decreasing in ring order.
        let stamp = now.max(inner.last_stamp);
        inner.last_stamp = stamp;
        let rec = AuditRecord::new(kind, message, uid, pid, object, stamp);
        let slot = (inner.write_index % self.capacity as u64) as usize;
        inner.buffer[slot] = rec;
        inner.write_index += 1;
        rec
    }

    /// Copy the valid window, oldest first, into caller-owned storage.
    pub fn snapshot_into(&self, out: &mut AuditSnapshot) {
        let inner = self.inner.lock();
        let len = inner.valid_len(self.capacity);
        let first = inner.first_seq(self.capacity);
        for i in 0..len {
            out.records[i] = inner.buffer[self.slot_of(first + i as u64)];
        }
        out.len = len;
    }

    /// Copy the valid window, oldest first, by value.
    pub fn snapshot(&self) -> AuditSnapshot {
        let mut snap = AuditSnapshot::empty();
        self.snapshot_into(&mut snap);
        snap
    }

    /// Push every valid record to `sink`, oldest first.
    ///
    /// The buffer is left intact, so draining twice with no record in
    /// between yields the same lines. Returns the number of records written.
    pub fn drain(&self, sink: &dyn LogSink) -> usize {
        let (first, len) = self.window();
        self.write_window(sink, first, len)
    }

    /// Drain with a header line, for the administrative flush command.
    pub fn flush(&self, sink: &dyn LogSink) -> usize {
        let (first, len) = self.window();
        sink_line!(sink, "[audit] Flushing {} audit records:", len);
        self.write_window(sink, first, len)
    }

    /// First sequence number and length of the valid window.
    fn window(&self) -> (u64, usize) {
        let inner = self.inner.lock();
        (inner.first_seq(self.capacity), inner.valid_len(self.capacity))
    }

    fn slot_of(&self, seq: u64) -> usize {
        (seq % self.capacity as u64) as usize
    }

    /// Copy of the record with sequence number `seq`, if it has not been
    /// overwritten since.
    fn record_at(&self, seq: u64) -> Option<AuditRecord> {
        let inner = self.inner.lock();
        if seq >= inner.first_seq(self.capacity) && seq < inner.write_index {
            Some(inner.buffer[self.slot_of(seq)])
        } else {
            None
        }
    }

    /// Write records `first..first + len`, one lock acquisition each.
    /// Records overwritten in the meantime are skipped.
    fn write_window(&self, sink: &dyn LogSink, first: u64, len: usize) -> usize {
        let mut written = 0;
        for seq in first..first + len as u64 {
            let Some(rec) = self.record_at(seq) else {
                continue;
            };
            sink_line!(sink, "[audit] #{} {}", written, rec);
            written += 1;
        }
        written
    }

    /// Number of records in the valid window.
    pub fn len(&self) -> usize {
        self.inner.lock().valid_len(self.capacity)
    }

    /// True if nothing has been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total records written since the last reset, including overwritten ones.
    pub fn total_recorded(&self) -> u64 {
        self.inner.lock().write_index
    }

    /// Effective ring capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Point-in-time copy of the audit window.
#[derive(Clone)]
pub struct AuditSnapshot {
    records: [AuditRecord; AUDIT_CAPACITY],
    len: usize,
}

impl AuditSnapshot {
    /// An empty snapshot, e.g. for static storage passed to
    /// [`AuditTrail::snapshot_into`].
    pub const fn empty() -> Self {
        const EMPTY: AuditRecord = AuditRecord::empty();
        Self {
            records: [EMPTY; AUDIT_CAPACITY],
            len: 0,
        }
    }

    /// Records oldest to newest.
    pub fn iter(&self) -> core::slice::Iter<'_, AuditRecord> {
        self.records[..self.len].iter()
    }

    /// Records oldest to newest, as a slice.
    pub fn as_slice(&self) -> &[AuditRecord] {
        &self.records[..self.len]
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the window was empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'s> IntoIterator for &'s AuditSnapshot {
    type Item = &'s AuditRecord;
    type IntoIter = core::slice::Iter<'s, AuditRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
