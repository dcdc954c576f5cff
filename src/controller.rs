use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode};

use crate::domain::{Message, SiftConfig, SiftError};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &SiftConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, SiftError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    // While a criterion is being edited every key goes to
                    // the line editor untranslated.
                    if model.raw_keyevents() {
                        return Ok(Some(Message::RawKey(key)));
                    }
                    return Ok(self.handle_key(key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Up => Some(Message::MoveUp),
            KeyCode::Down => Some(Message::MoveDown),
            KeyCode::Left => Some(Message::MoveLeft),
            KeyCode::Right => Some(Message::MoveRight),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            KeyCode::Home => Some(Message::MoveBeginning),
            KeyCode::End => Some(Message::MoveEnd),
            KeyCode::Tab => Some(Message::NextColumnChoice),
            KeyCode::BackTab => Some(Message::PrevColumnChoice),
            KeyCode::Char(' ') => Some(Message::ToggleRowAffordance),
            KeyCode::Char('c') => Some(Message::CopyCell),
            KeyCode::Char('r') => Some(Message::CopyRow),
            KeyCode::Char('f') => Some(Message::FilterMode),
            KeyCode::Char('e') => Some(Message::EditCriterion),
            KeyCode::Char('a') => Some(Message::ShowAll),
            KeyCode::Char('l') => Some(Message::LinePlot),
            KeyCode::Char('b') => Some(Message::BarPlot),
            KeyCode::Char('s') => Some(Message::ScatterPlot),
            KeyCode::Char('x') => Some(Message::CycleX),
            KeyCode::Char('y') => Some(Message::CycleY),
            KeyCode::Char('g') => Some(Message::ToggleCategory),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    #[test]
    fn key_mapping() {
        let controller = Controller::new(&SiftConfig::default());
        assert!(matches!(
            controller.handle_key(KeyEvent::from(KeyCode::Char('q'))),
            Some(Message::Quit)
        ));
        assert!(matches!(
            controller.handle_key(KeyEvent::from(KeyCode::Enter)),
            Some(Message::Enter)
        ));
        assert!(matches!(
            controller.handle_key(KeyEvent::from(KeyCode::Char('z'))),
            None
        ));
    }
}
