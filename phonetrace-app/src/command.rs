/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Lookup(String), // anything that is not a command
    Help,           // help | /help | ?
    Quit,           // quit | exit | /quit | /exit
    Empty,
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let verb = trimmed.strip_prefix('/').unwrap_or(trimmed);

    match verb.to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => Input::Quit,
        "help" | "?" => Input::Help,
        _ => Input::Lookup(trimmed.to_string()),
    }
}

pub const HELP: &str = "Type a phone number (with country code, e.g. +8801712345678) and press Enter.\nType `quit` or press Ctrl-D to leave.";
