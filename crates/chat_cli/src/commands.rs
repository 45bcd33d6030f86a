#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Clear,
    /// Switch persona; `None` shows the current one.
    Agent(Option<String>),
    /// Open a turn's full result; `None` when the argument is missing or not
    /// a turn number.
    Open(Option<usize>),
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "Commands: /help, /clear, /agent <name>, /open <turn>, /quit";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or(trimmed).to_string();
    let argument = parts.next();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/clear" => SlashCommand::Clear,
        "/agent" => SlashCommand::Agent(argument.map(str::to_string)),
        "/open" => SlashCommand::Open(argument.and_then(|value| value.parse().ok())),
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}
