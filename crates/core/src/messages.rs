//! Alert text for the boot announcement and each transition kind.

use crate::activity::ActivityTransition;

/// The configured notification texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    /// Sent once at process startup.
    pub boot: String,
    /// Sent when the appliance becomes active.
    pub start: String,
    /// Sent when the appliance becomes inactive.
    pub end: String,
}

impl Messages {
    /// The text to dispatch for `transition`. May be empty, in which case
    /// the dispatcher sends nothing.
    pub fn for_transition(&self, transition: &ActivityTransition) -> &str {
        if transition.became_active {
            &self.start
        } else {
            &self.end
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[test]
    fn picks_text_by_direction() {
        let messages = Messages {
            boot: "booted".into(),
            start: "washer running".into(),
            end: "washer done".into(),
        };
        let now = Instant::now();
        assert_eq!(
            messages.for_transition(&ActivityTransition::started(now)),
            "washer running"
        );
        assert_eq!(
            messages.for_transition(&ActivityTransition::stopped(now)),
            "washer done"
        );
    }
}
