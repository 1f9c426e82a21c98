//! The fixed command grammar typed at the chat prompt.

use crate::color::Palette;

/// A command recognised at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    Clip,
    PromptNew,
    PromptList,
    PromptLoad,
    Save,
    ChatNew,
    ChatList,
    ChatLoad,
}

impl Command {
    /// Every command, in table order. Fuzzy-match ties resolve to the earlier entry.
    pub const ALL: [Command; 10] = [
        Command::Exit,
        Command::Help,
        Command::Clip,
        Command::PromptNew,
        Command::PromptList,
        Command::PromptLoad,
        Command::Save,
        Command::ChatNew,
        Command::ChatList,
        Command::ChatLoad,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Exit => "exit",
            Command::Help => "help",
            Command::Clip => "clip",
            Command::PromptNew => "prompt new",
            Command::PromptList => "prompt list",
            Command::PromptLoad => "prompt load",
            Command::Save => "save",
            Command::ChatNew => "chat new",
            Command::ChatList => "chat list",
            Command::ChatLoad => "chat load",
        }
    }

    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Number of words in the longest command name.
    pub fn max_words() -> usize {
        Command::ALL
            .iter()
            .map(|c| c.name().split(' ').count())
            .max()
            .unwrap_or(1)
    }

    /// Match a raw input line against the grammar.
    ///
    /// Lines longer than the longest command are never commands. A two-word
    /// line matching a two-word command wins; otherwise a one-word command in
    /// first position matches.
    pub fn parse(line: &str) -> Option<Command> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() || tokens.len() > Command::max_words() {
            return None;
        }
        if tokens.len() == 2
            && let Some(command) = Command::from_name(&tokens.join(" "))
        {
            return Some(command);
        }
        Command::from_name(tokens[0]).filter(|c| !c.name().contains(' '))
    }
}

/// Name → help text pairs, built once at startup.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<(Command, String)>,
}

impl CommandTable {
    pub fn new(palette: &Palette) -> Self {
        let prompts_dir = palette.config("prompts_dir");
        let chats_dir = palette.config("chats_dir");
        let entries = Command::ALL
            .into_iter()
            .map(|command| {
                let help = match command {
                    Command::Exit => "exit simple-chat-gpt-cli".to_string(),
                    Command::Help => "display the message you are currently reading.".to_string(),
                    Command::Clip => {
                        "store the contents of the last chat completion in the clipboard."
                            .to_string()
                    }
                    Command::PromptNew => "create a new prompt and begin using it.".to_string(),
                    Command::PromptList => {
                        format!("list the saved prompts located in your {}", prompts_dir)
                    }
                    Command::PromptLoad => {
                        format!("load a saved prompt from your {}", prompts_dir)
                    }
                    Command::Save => "save the current chat history.".to_string(),
                    Command::ChatNew => "begin a new chat".to_string(),
                    Command::ChatList => {
                        format!("list the saved chats located in your {}", chats_dir)
                    }
                    Command::ChatLoad => format!("load a saved chat from your {}", chats_dir),
                };
                (command, help)
            })
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(c, help)| (c.name(), help.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + Clone + '_ {
        self.entries.iter().map(|(c, _)| c.name())
    }

    /// Length of the longest command name, in chars.
    pub fn longest_name_len(&self) -> usize {
        self.names().map(|n| n.chars().count()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_commands() {
        for command in Command::ALL {
            assert_eq!(Command::parse(command.name()), Some(command));
        }
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        assert_eq!(Command::parse("  prompt   load "), Some(Command::PromptLoad));
        assert_eq!(Command::parse("\texit"), Some(Command::Exit));
    }

    #[test]
    fn test_parse_first_token_single_word_command() {
        assert_eq!(Command::parse("save now"), Some(Command::Save));
        assert_eq!(Command::parse("exit please"), Some(Command::Exit));
    }

    #[test]
    fn test_parse_rejects_partial_and_long_input() {
        assert_eq!(Command::parse("prompt"), None);
        assert_eq!(Command::parse("chat"), None);
        assert_eq!(Command::parse("prompt delete"), None);
        assert_eq!(Command::parse("exit this program now"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("Exit"), None);
    }

    #[test]
    fn test_max_words() {
        assert_eq!(Command::max_words(), 2);
    }

    #[test]
    fn test_table_order_and_longest_name() {
        let table = CommandTable::new(&Palette::default());
        let names: Vec<_> = table.names().collect();
        assert_eq!(names[0], "exit");
        assert_eq!(names[9], "chat load");
        assert_eq!(table.longest_name_len(), "prompt list".len());
    }

    #[test]
    fn test_help_mentions_directories() {
        let table = CommandTable::new(&Palette::default());
        let (_, help) = table.iter().find(|(n, _)| *n == "chat list").unwrap();
        assert!(help.contains("chats_dir"));
    }
}
