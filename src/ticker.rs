//! Background heartbeat for a running resuscitation.
//!
//! The protocol core never sleeps; something outside it has to call
//! `tick` once per second. [`Ticker`] is that something: a named thread
//! that fires a callback on a `crossbeam-channel` tick until it is stopped
//! or dropped. Stopping joins the thread, so no callback runs afterwards.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select, tick};

/// A cancellable recurring callback on its own thread.
#[derive(Debug)]
pub struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Starts calling `on_tick` every `interval`. The first call happens one
    /// interval from now.
    pub fn spawn<F>(interval: Duration, mut on_tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticks = tick(interval);

        let handle = thread::Builder::new()
            .name("resus-ticker".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticks) -> _ => on_tick(),
                        // Fires when the sender is dropped.
                        recv(stop_rx) -> _ => break,
                    }
                }
                log::debug!("ticker stopped");
            })?;

        log::debug!("ticker started every {interval:?}");
        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Cancels the ticker and waits for its thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop.take());
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            log::warn!("ticker callback panicked");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
