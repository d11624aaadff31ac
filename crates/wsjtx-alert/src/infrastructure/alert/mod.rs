//! Audible alert: rings the terminal bell when a rule hits.
//!
//! A single long-lived `wsjtx-bell` worker thread owns the bell.  The receive
//! loop only pushes a request onto a bounded channel, so it never waits on
//! the pause between beeps.  The worker takes the output lock once per beep
//! and releases it before sleeping, leaving stdout free for log lines.
//!
//! Hits that arrive while a ring is already queued are coalesced: a burst of
//! matching decodes produces one extra ring, not one per decode.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error};

use crate::application::process_datagram::AlertSink;
use crate::domain::rules::AlertMatch;

/// ASCII BEL.
const BELL: &[u8] = b"\x07";

/// Pause between consecutive beeps.
const BEEP_INTERVAL: Duration = Duration::from_millis(300);

/// Ring requests waiting behind the one being played.
const QUEUE_DEPTH: usize = 1;

/// Beep count and spacing for one ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BellPattern {
    pub repeat: u32,
    pub interval: Duration,
}

impl BellPattern {
    pub fn new(repeat: u32) -> Self {
        Self {
            repeat,
            interval: BEEP_INTERVAL,
        }
    }

    /// Overrides the pause between beeps.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Writes the bell sequence, opening a fresh writer for every beep.
    ///
    /// The writer returned by `open` is dropped before each pause, so a
    /// lock guard such as `StdoutLock` is never held across the sleep.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from a writer.
    pub fn ring<W, F>(&self, mut open: F) -> io::Result<()>
    where
        W: Write,
        F: FnMut() -> W,
    {
        for i in 0..self.repeat {
            if i > 0 {
                thread::sleep(self.interval);
            }
            let mut out = open();
            out.write_all(BELL)?;
            out.flush()?;
        }
        Ok(())
    }
}

/// [`AlertSink`] that rings the terminal bell on a background worker.
#[derive(Debug)]
pub struct BellAlert {
    requests: Option<SyncSender<()>>,
}

impl BellAlert {
    /// Starts the bell worker writing to standard output.
    ///
    /// With `repeat == 0` no worker is started and alerts are silent.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the worker thread cannot be spawned.
    pub fn spawn(pattern: BellPattern) -> io::Result<Self> {
        Self::spawn_with(pattern, || io::stdout().lock())
    }

    /// Starts the bell worker with a caller-supplied writer factory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the worker thread cannot be spawned.
    pub fn spawn_with<W, F>(pattern: BellPattern, open: F) -> io::Result<Self>
    where
        W: Write,
        F: FnMut() -> W + Send + 'static,
    {
        if pattern.repeat == 0 {
            return Ok(Self { requests: None });
        }

        let (tx, rx) = mpsc::sync_channel(QUEUE_DEPTH);
        thread::Builder::new()
            .name("wsjtx-bell".to_string())
            .spawn(move || bell_loop(pattern, rx, open))?;

        Ok(Self { requests: Some(tx) })
    }
}

/// Plays one ring per request until every sender is dropped.
fn bell_loop<W, F>(pattern: BellPattern, requests: Receiver<()>, mut open: F)
where
    W: Write,
    F: FnMut() -> W,
{
    while requests.recv().is_ok() {
        if let Err(e) = pattern.ring(&mut open) {
            error!("failed to ring terminal bell: {e}");
        }
    }
    debug!("bell worker stopped");
}

impl AlertSink for BellAlert {
    fn alert(&self, _hit: &AlertMatch) {
        let Some(tx) = &self.requests else {
            return;
        };
        match tx.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => debug!("bell already queued; coalescing alert"),
            Err(TrySendError::Disconnected(())) => error!("bell worker is no longer running"),
        }
    }
}
