use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Error,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub message: String,
}

/// Messages accumulated while handling one request. Each is surfaced once: reading them
/// with [`MessageBag::take_all`] empties the bag.
#[derive(Debug, Clone, Default)]
pub struct MessageBag {
    messages: Vec<Message>,
}

impl MessageBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: MessageKind, message: impl Into<String>) {
        self.messages.push(Message {
            kind,
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(MessageKind::Error, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(MessageKind::Warning, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(MessageKind::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(MessageKind::Success, message);
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.kind == MessageKind::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn take_all(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    /// Message texts only, emptying the bag.
    pub fn take_texts(&mut self) -> Vec<String> {
        self.take_all().into_iter().map(|m| m.message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_all_empties_bag() {
        let mut bag = MessageBag::new();
        bag.error("first");
        bag.info("second");
        assert!(bag.has_errors());

        assert_eq!(bag.take_texts(), vec!["first", "second"]);
        assert!(bag.is_empty());
        assert!(bag.take_all().is_empty());
    }
}
