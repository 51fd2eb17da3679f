//! Status line with optional timeout

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StatusLine {
    text: String,
    expires_at: Option<Instant>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            expires_at: None,
        }
    }

    /// Show `text`; it disappears after `timeout` if one is given
    pub fn set(&mut self, text: impl Into<String>, timeout: Option<Duration>) {
        self.text = text.into();
        self.expires_at = timeout.map(|t| Instant::now() + t);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.expires_at = None;
    }

    /// Current text, empty once expired
    pub fn text(&self) -> &str {
        self.text_at(Instant::now())
    }

    fn text_at(&self, now: Instant) -> &str {
        match self.expires_at {
            Some(deadline) if now >= deadline => "",
            _ => &self.text,
        }
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_timeout() {
        let mut status = StatusLine::new();
        status.set("Map saved", Some(Duration::from_secs(10)));
        assert_eq!(status.text(), "Map saved");
        assert_eq!(status.text_at(Instant::now() + Duration::from_secs(11)), "");

        status.set("Loading", None);
        assert_eq!(status.text_at(Instant::now() + Duration::from_secs(3600)), "Loading");

        status.clear();
        assert_eq!(status.text(), "");
    }
}
