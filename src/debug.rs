//! Optional diagnostic hook.
//!
//! The renderer reports noteworthy backend events as [`DebugMessage`]s to a
//! hook the caller installs. Nothing is reported unless a hook is set.

use std::fmt;

/// Message ids known to be noise (buffer placement hints and the like).
pub const IGNORED_IDS: [u32; 4] = [131_169, 131_185, 131_218, 131_204];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugType {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Marker,
    PushGroup,
    PopGroup,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    High,
    Medium,
    Low,
    Notification,
}

impl fmt::Display for DebugSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DebugSource::Api => "API",
            DebugSource::WindowSystem => "Window System",
            DebugSource::ShaderCompiler => "Shader Compiler",
            DebugSource::ThirdParty => "Third Party",
            DebugSource::Application => "Application",
            DebugSource::Other => "Other",
        })
    }
}

impl fmt::Display for DebugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DebugType::Error => "Error",
            DebugType::DeprecatedBehavior => "Deprecated Behaviour",
            DebugType::UndefinedBehavior => "Undefined Behaviour",
            DebugType::Portability => "Portability",
            DebugType::Performance => "Performance",
            DebugType::Marker => "Marker",
            DebugType::PushGroup => "Push Group",
            DebugType::PopGroup => "Pop Group",
            DebugType::Other => "Other",
        })
    }
}

impl fmt::Display for DebugSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DebugSeverity::High => "high",
            DebugSeverity::Medium => "medium",
            DebugSeverity::Low => "low",
            DebugSeverity::Notification => "notification",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugMessage {
    pub source: DebugSource,
    pub kind: DebugType,
    pub severity: DebugSeverity,
    pub id: u32,
    pub text: String,
}

impl DebugMessage {
    pub fn new(
        source: DebugSource,
        kind: DebugType,
        severity: DebugSeverity,
        id: u32,
        text: impl Into<String>,
    ) -> Self {
        DebugMessage {
            source,
            kind,
            severity,
            id,
            text: text.into(),
        }
    }

    pub fn is_significant(&self) -> bool {
        !IGNORED_IDS.contains(&self.id)
    }

    /// Multi-line report, `None` for ignored ids.
    pub fn report(&self) -> Option<String> {
        if !self.is_significant() {
            return None;
        }
        Some(format!(
            "---------------\nDebug message ({}): {}\nSource: {}\nType: {}\nSeverity: {}\n\n",
            self.id, self.text, self.source, self.kind, self.severity
        ))
    }
}

pub type DebugHook = Box<dyn FnMut(&DebugMessage)>;

/// Hook printing every significant message to stdout.
pub fn stdout_hook() -> DebugHook {
    Box::new(|message: &DebugMessage| {
        if let Some(report) = message.report() {
            print!("{}", report);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u32) -> DebugMessage {
        DebugMessage::new(
            DebugSource::WindowSystem,
            DebugType::Performance,
            DebugSeverity::Low,
            id,
            "swapchain rebuilt",
        )
    }

    #[test]
    fn benign_ids_are_filtered() {
        for &id in &IGNORED_IDS {
            assert!(!message(id).is_significant());
            assert_eq!(message(id).report(), None);
        }
        assert!(message(1).is_significant());
    }

    #[test]
    fn report_lists_categories() {
        let report = message(7).report().unwrap();
        assert_eq!(
            report,
            "---------------\n\
             Debug message (7): swapchain rebuilt\n\
             Source: Window System\n\
             Type: Performance\n\
             Severity: low\n\n"
        );
    }

    #[test]
    fn labels() {
        assert_eq!(DebugSource::ShaderCompiler.to_string(), "Shader Compiler");
        assert_eq!(DebugType::DeprecatedBehavior.to_string(), "Deprecated Behaviour");
        assert_eq!(DebugType::PopGroup.to_string(), "Pop Group");
        assert_eq!(DebugSeverity::Notification.to_string(), "notification");
    }

    #[test]
    fn hook_receives_messages() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(vec![]));
        let sink = Rc::clone(&seen);
        let mut hook: DebugHook = Box::new(move |m: &DebugMessage| sink.borrow_mut().push(m.id));
        hook(&message(3));
        hook(&message(4));
        assert_eq!(*seen.borrow(), vec![3, 4]);
    }
}
