/// A chat command a handler answers to, as shown in `/help` and the
/// Telegram command menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub usage: Option<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn matches(&self, input: &str) -> bool {
        self.name.eq_ignore_ascii_case(input)
    }

    /// One `/help` line
    pub fn help_line(&self) -> String {
        match &self.usage {
            Some(usage) => format!("/{} {} - {}", self.name, usage, self.description),
            None => format!("/{} - {}", self.name, self.description),
        }
    }
}
