use std::{
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};

use crate::leaderboard::ViewState;

/// Everything the TUI loop reacts to
#[derive(Clone, Debug)]
pub enum Event {
    /// Key press event
    Key(KeyEvent),
    /// Terminal resize event
    Resize(u16, u16),
    /// Tick event for redrawing the clock and spinner
    Tick,
    /// Leaderboard controller published a new state
    View(ViewState),
}

/// Polls the terminal on a background thread and merges in controller updates
pub struct EventHandler {
    sender: mpsc::Sender<Event>,
    receiver: mpsc::Receiver<Event>,
    poller: thread::JoinHandle<()>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate);
        let (sender, receiver) = mpsc::channel();
        let poller = {
            let sender = sender.clone();
            thread::spawn(move || {
                let mut last_tick = Instant::now();
                loop {
                    let timeout = tick_rate
                        .checked_sub(last_tick.elapsed())
                        .unwrap_or_else(|| Duration::from_secs(0));

                    // a closed receiver or a broken terminal ends the poller
                    let forwarded = match event::poll(timeout) {
                        Ok(true) => match event::read() {
                            Ok(CrosstermEvent::Key(e)) if e.kind == event::KeyEventKind::Press => {
                                sender.send(Event::Key(e)).is_ok()
                            }
                            Ok(CrosstermEvent::Resize(w, h)) => sender.send(Event::Resize(w, h)).is_ok(),
                            Ok(_) => true,
                            Err(_) => false,
                        },
                        Ok(false) => true,
                        Err(_) => false,
                    };
                    if !forwarded {
                        break;
                    }

                    if last_tick.elapsed() >= tick_rate {
                        if sender.send(Event::Tick).is_err() {
                            break;
                        }
                        last_tick = Instant::now();
                    }
                }
            })
        };
        Self::from_parts(sender, receiver, poller, tick_rate)
    }

    fn from_parts(
        sender: mpsc::Sender<Event>,
        receiver: mpsc::Receiver<Event>,
        poller: thread::JoinHandle<()>,
        tick_rate: Duration,
    ) -> Self {
        Self {
            sender,
            receiver,
            poller,
            tick_rate,
        }
    }

    /// Sender for pushing controller updates into the loop
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.sender.clone()
    }

    /// Next event, or `None` once the terminal poller has stopped.
    ///
    /// The poller sends a tick every `tick_rate`, so a wait longer than that
    /// with the poller gone means no more input will arrive.
    pub fn next(&self) -> Option<Event> {
        loop {
            match self.receiver.recv_timeout(self.tick_rate) {
                Ok(event) => return Some(event),
                Err(mpsc::RecvTimeoutError::Timeout) if !self.poller.is_finished() => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler_with_stopped_poller() -> EventHandler {
        let (sender, receiver) = mpsc::channel();
        let poller = thread::spawn(|| {});
        while !poller.is_finished() {
            thread::yield_now();
        }
        EventHandler::from_parts(sender, receiver, poller, Duration::from_millis(5))
    }

    #[test]
    fn test_queued_updates_are_delivered() {
        let events = handler_with_stopped_poller();
        events.sender().send(Event::View(ViewState::Empty)).unwrap();

        assert!(matches!(events.next(), Some(Event::View(ViewState::Empty))));
    }

    #[test]
    fn test_stopped_poller_ends_the_stream() {
        let events = handler_with_stopped_poller();

        assert!(events.next().is_none());
    }
}
