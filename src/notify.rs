use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

pub trait Notifier {
    fn notify(&mut self, title: &str, body: &str, severity: Severity);

    fn latest(&self) -> Option<&Notice> {
        None
    }
}

#[derive(Debug, Default)]
pub struct StatusNotifier {
    latest: Option<Notice>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for StatusNotifier {
    fn notify(&mut self, title: &str, body: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(%title, %body, "notice"),
            Severity::Warning | Severity::Error => {
                warn!(%title, %body, severity = severity.label(), "notice")
            }
        }
        self.latest = Some(Notice {
            title: title.to_string(),
            body: body.to_string(),
            severity,
        });
    }

    fn latest(&self) -> Option<&Notice> {
        self.latest.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_notice() {
        let mut notifier = StatusNotifier::new();
        assert!(notifier.latest().is_none());
        notifier.notify("Up Next", "a.mp3", Severity::Info);
        notifier.notify("Could not find song", "zzz", Severity::Warning);
        let latest = notifier.latest().expect("notice");
        assert_eq!(latest.title, "Could not find song");
        assert_eq!(latest.severity, Severity::Warning);
    }
}
