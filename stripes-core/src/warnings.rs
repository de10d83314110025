use log::warn;

///
/// Run-level warnings, collected while the pipeline runs and reported once at
/// the end. Repeated messages are stored a single time.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Warnings {
    messages: Vec<String>,
}

impl Warnings {
    pub fn push<T: Into<String>>(&mut self, message: T) {
        let message = message.into();
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    pub fn extend(&mut self, other: Warnings) {
        for message in other.messages {
            self.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.messages.iter()
    }

    /// Log every collected warning.
    pub fn emit(&self) {
        for message in &self.messages {
            warn!("{}", message);
        }
    }
}
