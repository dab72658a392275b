// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Atomic publication of completed pipeline runs.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use time::OffsetDateTime;
use trustl_pipeline::Context;

/// A frozen, completed pipeline context plus the time it finished.
///
/// Snapshots are immutable; request handlers hold an `Arc` to one for the
/// duration of a request and never lock anything.
#[derive(Debug)]
pub struct Snapshot {
    context: Context,
    processed_at: OffsetDateTime,
}

impl Snapshot {
    /// Freezes a completed context, stamping the current time.
    pub fn new(context: Context) -> Self {
        Self {
            context,
            processed_at: OffsetDateTime::now_utc(),
        }
    }

    /// The completed context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// When the producing pipeline run finished.
    pub fn processed_at(&self) -> OffsetDateTime {
        self.processed_at
    }
}

/// A single atomic slot holding the latest completed snapshot.
///
/// `publish` is an atomic pointer store; `current` an atomic load. Readers
/// holding an old snapshot keep a consistent view until they drop it.
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    slot: ArcSwapOption<Snapshot>,
}

impl SnapshotPublisher {
    /// Creates an empty publisher; `current` yields `None` until the first
    /// publish.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new snapshot for subsequent readers.
    pub fn publish(&self, snapshot: Snapshot) {
        self.slot.store(Some(Arc::new(snapshot)));
    }

    /// The latest published snapshot.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.slot.load_full()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc as StdArc;

    use trustl_tsl::{SchemeInformation, Source, StatusList, TslTree};

    use super::*;

    fn context_with_tree(source: &str) -> Context {
        let mut context = Context::new();
        context.add_tree(TslTree::singleton(StdArc::new(StatusList::new(
            SchemeInformation::new("SE", "t", 1, None, None, vec![]),
            vec![],
            Source::new(source),
            vec![],
        ))));
        context
    }

    #[test]
    fn empty_until_first_publish() {
        let publisher = SnapshotPublisher::new();
        assert!(publisher.current().is_none());
    }

    #[test]
    fn publish_replaces_the_current_snapshot() {
        let publisher = SnapshotPublisher::new();
        publisher.publish(Snapshot::new(context_with_tree("mem://first")));

        let first = publisher.current().unwrap();
        assert_eq!(first.context().tsl_count(), 1);

        publisher.publish(Snapshot::new(context_with_tree("mem://second")));
        let second = publisher.current().unwrap();
        assert_eq!(
            second.context().trees()[0].source().as_str(),
            "mem://second"
        );

        // the reader that grabbed the first snapshot still sees it whole
        assert_eq!(
            first.context().trees()[0].source().as_str(),
            "mem://first"
        );
    }
}
