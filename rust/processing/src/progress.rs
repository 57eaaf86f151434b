// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Progress reporting
//!
//! The assembler pushes `(overall, sub, label)` snapshots from the worker
//! thread without throttling. Sinks that feed a UI should sample or batch.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Receives progress snapshots; percentages are in `0..=100`
pub trait ProgressSink: Send + Sync {
    fn report(&self, overall: u8, sub: u8, label: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(u8, u8, &str) + Send + Sync,
{
    fn report(&self, overall: u8, sub: u8, label: &str) {
        self(overall, sub, label)
    }
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    #[inline]
    fn report(&self, _overall: u8, _sub: u8, _label: &str) {}
}

/// One progress snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub overall: u8,
    pub sub: u8,
    pub label: String,
}

/// Forwards reports over a crossbeam channel, for hosts that drain
/// progress on their own thread
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: Sender<ProgressUpdate>,
}

impl ChannelProgress {
    pub fn new(tx: Sender<ProgressUpdate>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end of its channel
    pub fn channel() -> (Self, Receiver<ProgressUpdate>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, overall: u8, sub: u8, label: &str) {
        // A dropped receiver only means nobody is watching
        let _ = self.tx.send(ProgressUpdate {
            overall,
            sub,
            label: label.to_string(),
        });
    }
}

/// Integer percentage of `done` out of `total`, clamped to 100
#[inline]
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
