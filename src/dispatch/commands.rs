//! Chat command parsing.

pub const ASK_AI_COMMAND: &str = "!askai";
pub const WEATHER_COMMAND: &str = "!weather";
pub const IGNORE_COMMAND: &str = "!ignore";
pub const UNIGNORE_COMMAND: &str = "!unignore";
pub const RESET_BRAIN_COMMAND: &str = "!resetbrain";

/// Commands only the channel owner may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerCommand<'a> {
    Ignore(&'a str),
    Unignore(&'a str),
    ResetBrain,
}

impl<'a> OwnerCommand<'a> {
    /// User arguments lose a leading `@`.
    pub fn parse(message: &'a str) -> Option<Self> {
        if let Some(user) = command_argument(message, IGNORE_COMMAND) {
            return Some(OwnerCommand::Ignore(user.trim_start_matches('@')));
        }
        if let Some(user) = command_argument(message, UNIGNORE_COMMAND) {
            return Some(OwnerCommand::Unignore(user.trim_start_matches('@')));
        }
        command_argument(message, RESET_BRAIN_COMMAND).map(|_| OwnerCommand::ResetBrain)
    }
}

/// Argument of `command` if `message` invokes it.
///
/// The command matches case-insensitively and must be followed by
/// whitespace or the end of the message; the argument is trimmed and may
/// be empty.
pub fn command_argument<'a>(message: &'a str, command: &str) -> Option<&'a str> {
    let message = message.trim_start();
    let head = message.get(..command.len())?;
    if !head.eq_ignore_ascii_case(command) {
        return None;
    }

    let rest = &message[command.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

/// True for `!`-prefixed lines.
pub fn is_command(message: &str) -> bool {
    message.trim_start().starts_with('!')
}
