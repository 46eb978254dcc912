//! Full-screen terminal presentation using crossterm.
//!
//! The terminal is switched to the alternate screen in raw mode for the
//! lifetime of the [`TerminalScreen`] and restored when it is dropped.

use super::{DisplayError, Key, Screen};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size as terminal_size, Clear, ClearType,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{stdout, Stdout, Write};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// White-on-black text frames in the terminal's alternate screen.
pub struct TerminalScreen {
    out: Stdout,
    /// Key reported for Ctrl+C, which raw mode delivers as a key press
    interrupt: Key,
}

impl TerminalScreen {
    /// Take over the terminal. Ctrl+C is reported as `interrupt`.
    pub fn new(interrupt: Key) -> Result<Self, DisplayError> {
        enable_raw_mode()?;
        let mut out = stdout();
        if let Err(e) = execute!(
            out,
            EnterAlternateScreen,
            Hide,
            SetBackgroundColor(Color::Black),
            Clear(ClearType::All)
        ) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        Ok(Self { out, interrupt })
    }

    /// Discard any key presses already queued by the terminal.
    fn drain_pending(&mut self) -> Result<(), DisplayError> {
        while event::poll(Duration::ZERO)? {
            event::read()?;
        }
        Ok(())
    }
}

impl Screen for TerminalScreen {
    fn flip_text(&mut self, text: &str) -> Result<(), DisplayError> {
        let (cols, rows) = terminal_size()?;
        let lines: Vec<&str> = text.lines().collect();

        queue!(
            self.out,
            SetBackgroundColor(Color::Black),
            SetForegroundColor(Color::White),
            Clear(ClearType::All)
        )?;

        let top = (rows / 2).saturating_sub(lines.len() as u16 / 2);
        for (i, line) in lines.iter().enumerate() {
            let width = line.chars().count() as u16;
            let col = cols.saturating_sub(width) / 2;
            queue!(self.out, MoveTo(col, top + i as u16), Print(line))?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn wait_keys(
        &mut self,
        keys: &[Key],
        timeout: Option<Duration>,
    ) -> Result<Option<Key>, DisplayError> {
        self.drain_pending()?;
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    (deadline - now).min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            if !event::poll(wait)? {
                continue;
            }

            if let Event::Key(key_event) = event::read()? {
                if let Some(key) = map_key(&key_event, self.interrupt) {
                    if keys.contains(&key) {
                        return Ok(Some(key));
                    }
                }
            }
        }
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Translate a crossterm key press; Ctrl+C becomes `interrupt`.
fn map_key(event: &KeyEvent, interrupt: Key) -> Option<Key> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Some(interrupt),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Enter => Some(Key::Enter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_map_letters_lowercase() {
        let event = press(KeyCode::Char('Y'), KeyModifiers::SHIFT);
        assert_eq!(map_key(&event, Key::Escape), Some(Key::Char('y')));
    }

    #[test]
    fn test_ctrl_c_is_the_interrupt_key() {
        let event = press(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&event, Key::Escape), Some(Key::Escape));
        assert_eq!(map_key(&event, Key::Char('q')), Some(Key::Char('q')));

        let plain = press(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(map_key(&plain, Key::Char('q')), Some(Key::Char('c')));
    }

    #[test]
    fn test_release_is_ignored() {
        let mut event = press(KeyCode::Char('y'), KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(map_key(&event, Key::Escape), None);
    }

    #[test]
    fn test_special_keys() {
        assert_eq!(
            map_key(&press(KeyCode::Esc, KeyModifiers::NONE), Key::Escape),
            Some(Key::Escape)
        );
        assert_eq!(
            map_key(&press(KeyCode::Enter, KeyModifiers::NONE), Key::Escape),
            Some(Key::Enter)
        );
        assert_eq!(
            map_key(&press(KeyCode::Char(' '), KeyModifiers::NONE), Key::Escape),
            Some(Key::Space)
        );
        assert_eq!(map_key(&press(KeyCode::F(1), KeyModifiers::NONE), Key::Escape), None);
    }
}
