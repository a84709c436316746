//! Input Actor: Dedicated thread for polling terminal events.
//!
//! This actor runs in its own thread and uses crossterm's event polling
//! to capture keyboard, mouse wheel, paste and resize events. Every event
//! goes into the session queue, so keystrokes and captured output are
//! consumed by the same single owner.

use super::messages::{InputEvent, KeyCode, KeyModifiers, SessionEvent};
use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyEventKind};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Input actor that polls terminal events.
pub struct InputActor {
    /// Handle to the input thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl InputActor {
    /// Spawn the input actor thread.
    ///
    /// # Arguments
    ///
    /// * `sender` - Session queue.
    /// * `poll_timeout` - How long to wait for events before checking shutdown.
    pub fn spawn(sender: Sender<SessionEvent>, poll_timeout: Duration) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("riveflow-input".to_string())
            .spawn(move || {
                Self::run_loop(&sender, &shutdown_clone, poll_timeout);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the input thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the input thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main input polling loop.
    fn run_loop(sender: &Sender<SessionEvent>, shutdown: &AtomicBool, poll_timeout: Duration) {
        let send = |event: InputEvent| sender.send(SessionEvent::Input(event)).is_ok();

        loop {
            if shutdown.load(Ordering::Relaxed) {
                let _ = send(InputEvent::Shutdown);
                break;
            }

            match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if let Some(input_event) = convert_event(event) {
                            if !send(input_event) {
                                // Session gone.
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = send(InputEvent::Error(e.to_string()));
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    let _ = send(InputEvent::Error(e.to_string()));
                }
            }
        }
    }
}

impl Drop for InputActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Convert a crossterm event to our `InputEvent`.
pub fn convert_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key_event) => {
            // Only process key press events (not release or repeat)
            if key_event.kind != KeyEventKind::Press {
                return None;
            }

            let code = convert_key_code(key_event.code)?;
            let modifiers = convert_modifiers(key_event.modifiers);

            Some(InputEvent::Key { code, modifiers })
        }

        Event::Mouse(mouse_event) => match mouse_event.kind {
            event::MouseEventKind::ScrollUp => Some(InputEvent::MouseScroll { delta: 3 }),
            event::MouseEventKind::ScrollDown => Some(InputEvent::MouseScroll { delta: -3 }),
            _ => None,
        },

        Event::Resize(width, height) => Some(InputEvent::Resize { width, height }),

        Event::Paste(text) => Some(InputEvent::Paste(text)),

        Event::FocusGained | Event::FocusLost => None,
    }
}

/// Convert crossterm `KeyCode` to our `KeyCode`.
fn convert_key_code(code: event::KeyCode) -> Option<KeyCode> {
    Some(match code {
        event::KeyCode::Char(c) => KeyCode::Char(c),
        event::KeyCode::Backspace => KeyCode::Backspace,
        event::KeyCode::Enter => KeyCode::Enter,
        event::KeyCode::Left => KeyCode::Left,
        event::KeyCode::Right => KeyCode::Right,
        event::KeyCode::Up => KeyCode::Up,
        event::KeyCode::Down => KeyCode::Down,
        event::KeyCode::Home => KeyCode::Home,
        event::KeyCode::End => KeyCode::End,
        event::KeyCode::PageUp => KeyCode::PageUp,
        event::KeyCode::PageDown => KeyCode::PageDown,
        event::KeyCode::Delete => KeyCode::Delete,
        event::KeyCode::Esc => KeyCode::Esc,
        _ => return None, // Ignore other key codes
    })
}

/// Convert crossterm `KeyModifiers` to our `KeyModifiers`.
fn convert_modifiers(mods: event::KeyModifiers) -> KeyModifiers {
    KeyModifiers {
        control: mods.contains(event::KeyModifiers::CONTROL),
        alt: mods.contains(event::KeyModifiers::ALT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState};

    fn press(code: event::KeyCode, modifiers: event::KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_convert_ctrl_key() {
        let event = convert_event(press(event::KeyCode::Char('k'), event::KeyModifiers::CONTROL));
        assert_eq!(event, Some(InputEvent::ctrl('k')));
    }

    #[test]
    fn test_convert_ignores_release() {
        let event = Event::Key(KeyEvent {
            code: event::KeyCode::Char('i'),
            modifiers: event::KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(convert_event(event), None);
    }

    #[test]
    fn test_convert_unbound_key_is_dropped() {
        assert_eq!(
            convert_event(press(event::KeyCode::F(5), event::KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn test_convert_resize_and_paste() {
        assert_eq!(
            convert_event(Event::Resize(100, 40)),
            Some(InputEvent::Resize {
                width: 100,
                height: 40
            })
        );
        assert_eq!(
            convert_event(Event::Paste("hello".into())),
            Some(InputEvent::Paste("hello".into()))
        );
    }
}
