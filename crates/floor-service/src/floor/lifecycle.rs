//! Session lifecycle: `ACTIVE <-> ON_BREAK`, either of them `-> ENDED`.

use serde::{Deserialize, Serialize};

use crate::errors::FloorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
    #[default]
    Active,
    OnBreak,
    /// Absorbing.
    Ended,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionLifecycle {
    mode: SessionMode,
}

impl SessionLifecycle {
    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn check_call_break(&self) -> Result<(), FloorError> {
        match self.mode {
            SessionMode::Active => Ok(()),
            SessionMode::OnBreak => Err(FloorError::InvalidTransition(
                "The floor is already on break".to_string(),
            )),
            SessionMode::Ended => Err(FloorError::SessionEnded),
        }
    }

    pub fn check_end_break(&self) -> Result<(), FloorError> {
        match self.mode {
            SessionMode::OnBreak => Ok(()),
            SessionMode::Active => Err(FloorError::InvalidTransition(
                "The floor is not on break".to_string(),
            )),
            SessionMode::Ended => Err(FloorError::SessionEnded),
        }
    }

    pub fn call_break(&mut self) -> Result<(), FloorError> {
        self.check_call_break()?;
        self.mode = SessionMode::OnBreak;
        Ok(())
    }

    pub fn end_break(&mut self) -> Result<(), FloorError> {
        self.check_end_break()?;
        self.mode = SessionMode::Active;
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), FloorError> {
        if self.mode == SessionMode::Ended {
            return Err(FloorError::SessionEnded);
        }
        self.mode = SessionMode::Ended;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_break_round_trip() {
        let mut lifecycle = SessionLifecycle::default();
        lifecycle.call_break().unwrap();
        assert_eq!(lifecycle.mode(), SessionMode::OnBreak);
        assert!(lifecycle.call_break().is_err());
        lifecycle.end_break().unwrap();
        assert_eq!(lifecycle.mode(), SessionMode::Active);
        assert!(matches!(
            lifecycle.end_break().unwrap_err(),
            FloorError::InvalidTransition(_)
        ));
    }

    #[test]
    fn test_ended_is_absorbing() {
        let mut lifecycle = SessionLifecycle::default();
        lifecycle.call_break().unwrap();
        lifecycle.end().unwrap();

        assert_eq!(lifecycle.call_break().unwrap_err(), FloorError::SessionEnded);
        assert_eq!(lifecycle.end_break().unwrap_err(), FloorError::SessionEnded);
        assert_eq!(lifecycle.end().unwrap_err(), FloorError::SessionEnded);
        assert_eq!(lifecycle.mode(), SessionMode::Ended);
    }
}
