//! The live-block registry: a side table of records threaded into a
//! circular doubly-linked list.
//!
//! Records are keyed by payload address. Links are addresses too, so a
//! relocation only has to re-key one entry and patch its two neighbours.

use indexmap::IndexMap;

use crate::record::HeapBlockRecord;

#[derive(Debug, Default)]
pub(crate) struct BlockList {
    records: IndexMap<usize, HeapBlockRecord>,
    /// The record designated "first". `None` iff the list is empty.
    anchor: Option<usize>,
}

impl BlockList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub(crate) fn get(&self, address: usize) -> Option<&HeapBlockRecord> {
        self.records.get(&address)
    }

    /// Splice `record` in just before the anchor (at the tail). An empty
    /// list makes it the anchor.
    pub(crate) fn push(&mut self, mut record: HeapBlockRecord) {
        let address = record.address;
        match self.anchor {
            None => {
                record.prev = address;
                record.next = address;
                self.anchor = Some(address);
            }
            Some(anchor) => {
                let tail = self.records[&anchor].prev;
                record.prev = tail;
                record.next = anchor;
                self.records[&tail].next = address;
                self.records[&anchor].prev = address;
            }
        }
        self.records.insert(address, record);
    }

    /// Unlink and return the record at `address`.
    pub(crate) fn remove(&mut self, address: usize) -> Option<HeapBlockRecord> {
        let record = self.records.swap_remove(&address)?;
        if record.next == address {
            // Sole element.
            self.anchor = None;
        } else {
            // With two elements prev == next and the survivor ends up
            // linked to itself.
            self.records[&record.prev].next = record.next;
            self.records[&record.next].prev = record.prev;
            if self.anchor == Some(address) {
                self.anchor = Some(record.next);
            }
        }
        Some(record)
    }

    /// Move the record at `from` to key `to`, repairing neighbour links and
    /// the anchor. Returns the moved record.
    pub(crate) fn relocate(&mut self, from: usize, to: usize) -> Option<&mut HeapBlockRecord> {
        if from != to {
            let mut record = self.records.swap_remove(&from)?;
            record.address = to;
            if record.next == from {
                record.prev = to;
                record.next = to;
            } else {
                self.records[&record.prev].next = to;
                self.records[&record.next].prev = to;
            }
            if self.anchor == Some(from) {
                self.anchor = Some(to);
            }
            self.records.insert(to, record);
        }
        self.records.get_mut(&to)
    }

    /// Walk the list once, starting at the anchor.
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.anchor,
            remaining: self.records.len(),
        }
    }
}

pub(crate) struct Iter<'a> {
    list: &'a BlockList,
    cursor: Option<usize>,
    /// Bounds the walk even if links were ever to form a shorter cycle.
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a HeapBlockRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let record = self.list.records.get(&self.cursor?)?;
        self.remaining -= 1;
        self.cursor = if Some(record.next) == self.list.anchor {
            None
        } else {
            Some(record.next)
        };
        Some(record)
    }
}
