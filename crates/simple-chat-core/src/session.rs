//! The interactive chat session.
//!
//! A [`Session`] owns everything one run of the program needs: the
//! conversation, the prompt and chat stores, the last reply, the usage
//! counters and the resolved config. Each input line is either rejected with
//! a suggestion, dispatched as a command, or sent to the completion backend
//! as a user turn.
//!
//! Every dialog goes through [`Session::confirm`] and [`Session::ask_selection`],
//! so the accepted answers are the same everywhere: exactly `y` or `yes`
//! confirms, and selections are 1-based numbers.

use crate::api::CompletionBackend;
use crate::color::{center, rjust, visible_len};
use crate::commands::{Command, CommandTable};
use crate::config::ResolvedConfig;
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::fuzzy::find_similar_command;
use crate::render::{StreamRenderer, render_stream};
use crate::store::{CHAT_EXTENSION, NamedStore, PROMPT_EXTENSION, chat_to_json, read_chat_file};
use crate::terminal::Terminal;
use crate::usage::{TokenUsage, account_token_usage};
use crate::wrap::wrap_text;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::Path;

/// Whether the input loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The one affirmative answer set used by every yes/no question.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer, "y" | "yes")
}

fn end_of_input() -> Error {
    Error::Io(io::Error::new(ErrorKind::UnexpectedEof, "end of input"))
}

fn is_end_of_input(err: &Error) -> bool {
    matches!(err, Error::Io(e) if e.kind() == ErrorKind::UnexpectedEof)
}

fn open_store(dir: &Path, extension: &'static str) -> Result<NamedStore> {
    NamedStore::open(dir, extension).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::config(format!("Couldn't find directory {}", dir.display())),
        _ => Error::config(format!("Couldn't read directory {}: {}", dir.display(), e)),
    })
}

pub struct Session<B, T> {
    config: ResolvedConfig,
    backend: B,
    terminal: T,
    commands: CommandTable,
    conversation: Conversation,
    prompts: NamedStore,
    chats: NamedStore,
    last_response: Option<String>,
    session_usage: TokenUsage,
    lifetime_usage: TokenUsage,
}

impl<B: CompletionBackend, T: Terminal> Session<B, T> {
    /// Open the prompt and chat directories and read the usage file.
    ///
    /// Any of those missing is a configuration error. The conversation starts
    /// as a single empty system message.
    pub fn new(config: ResolvedConfig, backend: B, terminal: T) -> Result<Self> {
        let prompts = open_store(&config.prompts_dir, PROMPT_EXTENSION)?;
        let chats = open_store(&config.chats_dir, CHAT_EXTENSION)?;
        let lifetime_usage = TokenUsage::load(&config.token_usage_file)?;
        let commands = CommandTable::new(&config.palette);
        Ok(Self {
            config,
            backend,
            terminal,
            commands,
            conversation: Conversation::with_system(""),
            prompts,
            chats,
            last_response: None,
            session_usage: TokenUsage::default(),
            lifetime_usage,
        })
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn session_usage(&self) -> &TokenUsage {
        &self.session_usage
    }

    pub fn prompt_names(&self) -> &[String] {
        self.prompts.names()
    }

    pub fn chat_names(&self) -> &[String] {
        self.chats.names()
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn print_banner(&mut self) -> Result<()> {
        let palette = &self.config.palette;
        let hint = format!(
            "type {} to exit, or {} for a list of commands",
            palette.command("exit"),
            palette.command("help")
        );
        self.blank()?;
        self.centered("Welcome to simple-chat-gpt-cli")?;
        self.centered(&hint)?;
        self.blank()?;
        Ok(())
    }

    /// Replace the conversation with a chat file given on the command line.
    pub fn start_with_chat(&mut self, path: &Path) -> Result<()> {
        let conversation = self.load_chat_file(path)?;
        self.replace_conversation(conversation);
        Ok(())
    }

    /// Apply a prompt file given on the command line.
    pub fn start_with_prompt(&mut self, path: &Path) -> Result<()> {
        let prompt = self.load_prompt_file(path)?;
        self.conversation.apply_prompt(&prompt);
        Ok(())
    }

    /// Read and handle lines until `exit` or end of input.
    ///
    /// Write failures are reported and the loop continues; any other error
    /// ends the session and is returned.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let result = match self.read_input() {
                Ok(line) => self.handle_line(&line).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) if is_end_of_input(&e) => {
                    self.exit()?;
                    return Ok(());
                }
                Err(e) if !e.is_fatal() => self.report(&e)?,
                Err(e) => return Err(e),
            }
        }
    }

    /// Handle one input line.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            self.blank()?;
            return Ok(Flow::Continue);
        }

        let prompt_names = self.prompts.names().iter().map(String::as_str);
        if let Some(suggestion) = find_similar_command(line, self.commands.names(), prompt_names) {
            let message = format!("Did you mean {}?", self.config.palette.command(suggestion));
            self.centered(&message)?;
            return Ok(Flow::Continue);
        }

        if let Some(command) = Command::parse(line) {
            return self.dispatch(command);
        }

        self.chat_turn(line).await?;
        Ok(Flow::Continue)
    }

    fn dispatch(&mut self, command: Command) -> Result<Flow> {
        log::debug!("command: {}", command.name());
        match command {
            Command::Exit => return self.exit(),
            Command::Help => self.print_help()?,
            Command::Clip => self.clip()?,
            Command::PromptNew => self.prompt_new()?,
            Command::PromptList => self.prompt_list()?,
            Command::PromptLoad => self.prompt_load()?,
            Command::Save => self.save_chat()?,
            Command::ChatNew => self.chat_new()?,
            Command::ChatList => self.chat_list()?,
            Command::ChatLoad => self.chat_load()?,
        }
        Ok(Flow::Continue)
    }

    async fn chat_turn(&mut self, line: &str) -> Result<()> {
        self.conversation.push_user(line);

        let stream = self
            .backend
            .stream_chat(self.conversation.messages())
            .await?;
        let mut renderer = StreamRenderer::begin(self.terminal.writer(), self.config.term_width)?;
        let reply = render_stream(stream, &mut renderer).await?;
        self.session_usage.add_completion(renderer.fragment_count());

        self.conversation.push_assistant(reply.clone());
        self.last_response = Some(reply);
        Ok(())
    }

    fn exit(&mut self) -> Result<Flow> {
        account_token_usage(&self.session_usage, &self.lifetime_usage);
        self.blank()?;
        Ok(Flow::Exit)
    }

    fn print_help(&mut self) -> Result<()> {
        let width = self.config.term_width;
        let name_space = width * 35 / 100;
        let indent = " ".repeat(name_space + 2);

        let mut lines = Vec::new();
        for (name, help) in self.commands.iter() {
            let wrapped = wrap_text(help, (name_space + 2, width), visible_len);
            let colored = self.config.palette.command(name);
            let first = wrapped.first().map(String::as_str).unwrap_or("");
            lines.push(format!("{}  {}", rjust(&colored, name_space), first));
            for rest in wrapped.iter().skip(1) {
                lines.push(format!("{}{}", indent, rest));
            }
        }
        for line in lines {
            self.say(&line)?;
        }
        self.blank()?;
        Ok(())
    }

    fn clip(&mut self) -> Result<()> {
        let Some(reply) = self.last_response.clone() else {
            let message = format!(
                "Must provide an initial message before you can {}",
                self.config.palette.command("clip")
            );
            self.blank()?;
            self.centered(&message)?;
            return Ok(());
        };
        if let Err(e) = self.terminal.set_clipboard(&reply) {
            log::warn!("clipboard write failed: {}", e);
            let tag = self.config.palette.error("CLIPBOARD ERROR");
            self.say(&format!("\n   {}: {}", tag, e))?;
        }
        Ok(())
    }

    fn prompt_new(&mut self) -> Result<()> {
        let mut target = "current";
        if self.last_response.is_some() {
            self.say("\n   Start new chat? y/n")?;
            if self.confirm()? {
                target = "new";
                self.replace_conversation(Conversation::new());
            }
        }
        let prompt = self.enter_prompt()?;
        self.conversation.apply_prompt(&prompt);
        self.say(&format!("\n   Prompt applied to {} chat.", target))?;
        Ok(())
    }

    fn prompt_list(&mut self) -> Result<()> {
        if self.prompts.is_empty() {
            let message = self.none_located("prompts", self.prompts.dir());
            return Ok(self.say(&message)?);
        }
        let names = self.prompts.names().to_vec();
        self.print_listing(&names)?;
        Ok(())
    }

    fn prompt_load(&mut self) -> Result<()> {
        if self.prompts.is_empty() {
            let message = self.none_located("prompts", self.prompts.dir());
            return Ok(self.say(&message)?);
        }
        if self.last_response.is_some() {
            self.say("\n   Start new chat? y/n")?;
            if self.confirm()? {
                self.replace_conversation(Conversation::new());
            }
        }
        let name = self.select_from(self.prompts.names().to_vec())?;
        let prompt = self.load_prompt_file(&self.prompts.path_for(&name))?;
        self.conversation.apply_prompt(&prompt);
        Ok(())
    }

    fn save_chat(&mut self) -> Result<()> {
        self.say("\n   What would you like to name this chat?")?;
        let name = self.read_input()?;
        if self.chats.contains(&name) {
            self.say("\n   There is already a chat saved with that name. Overwrite it?")?;
            if !self.confirm()? {
                self.say("\n   Not saving chat.")?;
                return Ok(());
            }
        }
        let json = chat_to_json(&self.conversation)?;
        let path = self.chats.path_for(&name);
        self.chats
            .write(&name, &json)
            .map_err(|source| Error::Persistence { path, source })?;
        let message = self.saved_to("$chats_dir", &self.chats.file_name(&name));
        self.say(&message)?;
        Ok(())
    }

    fn chat_new(&mut self) -> Result<()> {
        self.say("\n   Leave current chat? y/n")?;
        if !self.confirm()? {
            self.say("\n   Not starting new chat.")?;
            return Ok(());
        }

        let mut prompt = String::new();
        self.say("\n   Include prompt? y/n")?;
        if self.confirm()? {
            let use_existing = if self.prompts.is_empty() {
                false
            } else {
                self.say("\n   Use existing prompt? y/n")?;
                self.confirm()?
            };
            prompt = if use_existing {
                let name = self.select_from(self.prompts.names().to_vec())?;
                self.load_prompt_file(&self.prompts.path_for(&name))?
            } else {
                self.enter_prompt()?
            };
        }
        self.replace_conversation(Conversation::with_system(prompt));
        self.say("\n   Begin new chat")?;
        Ok(())
    }

    fn chat_list(&mut self) -> Result<()> {
        if self.chats.is_empty() {
            let message = self.none_located("chats", self.chats.dir());
            return Ok(self.say(&message)?);
        }
        let names = self.chats.names().to_vec();
        self.print_listing(&names)?;
        Ok(())
    }

    fn chat_load(&mut self) -> Result<()> {
        if self.chats.is_empty() {
            let message = self.none_located("chats", self.chats.dir());
            return Ok(self.say(&message)?);
        }
        if self.last_response.is_some() {
            self.say("\n   Leave current chat? y/n")?;
            if !self.confirm()? {
                self.say("\n   Not starting new chat.")?;
                return Ok(());
            }
        }
        let name = self.select_from(self.chats.names().to_vec())?;
        let conversation = self.load_chat_file(&self.chats.path_for(&name))?;
        self.replace_conversation(conversation);
        Ok(())
    }

    /// Read a new prompt and offer to save it.
    fn enter_prompt(&mut self) -> Result<String> {
        self.centered("Enter your prompt:")?;
        self.blank()?;
        let prompt = self.read_input()?;
        self.offer_to_save_prompt(&prompt)?;
        Ok(prompt)
    }

    fn offer_to_save_prompt(&mut self, prompt: &str) -> Result<()> {
        self.say("\n   Save this prompt for future use? y/n")?;
        if !self.confirm()? {
            return Ok(());
        }
        self.say("\n   Prompt name: ")?;
        let name = self.read_input()?;
        if self.prompts.contains(&name) {
            let message = format!(
                "\n   There is already a prompt with that name saved in {}.\n   Do you want to overwrite it?",
                self.config.palette.config("$prompts_dir")
            );
            self.say(&message)?;
            if !self.confirm()? {
                self.say("\n   Prompt left unsaved.")?;
                return Ok(());
            }
        }
        match self.prompts.write(&name, prompt) {
            Ok(_) => {
                let message = self.saved_to("$prompts_dir", &self.prompts.file_name(&name));
                self.say(&message)?;
            }
            Err(source) => {
                let path = self.prompts.path_for(&name);
                self.report(&Error::Persistence { path, source })?;
            }
        }
        Ok(())
    }

    fn load_prompt_file(&mut self, path: &Path) -> Result<String> {
        let prompt = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Couldn't read {}: {}", path.display(), e)))?;
        let message = format!(
            "\n   Loaded prompt at {}",
            self.config.palette.config(&path.display().to_string())
        );
        self.say(&message)?;
        Ok(prompt)
    }

    fn load_chat_file(&mut self, path: &Path) -> Result<Conversation> {
        let conversation = read_chat_file(path).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => Error::config(e.to_string()),
            _ => Error::config(format!("Couldn't read {}: {}", path.display(), e)),
        })?;
        let message = format!(
            "\n   Loaded chat at {}",
            self.config.palette.config(&path.display().to_string())
        );
        self.say(&message)?;
        Ok(conversation)
    }

    /// Swap in a whole new conversation; the last reply follows it.
    fn replace_conversation(&mut self, conversation: Conversation) {
        self.last_response = conversation.last_assistant().map(str::to_string);
        self.conversation = conversation;
    }

    fn select_from(&mut self, names: Vec<String>) -> Result<String> {
        self.print_listing(&names)?;
        let selection = self.ask_selection(names.len())?;
        Ok(names[selection - 1].clone())
    }

    /// Ask yes/no. Only `y` and `yes` count as yes.
    pub fn confirm(&mut self) -> Result<bool> {
        let answer = self.read_input()?;
        Ok(is_affirmative(&answer))
    }

    /// Ask for a number in `1..=count`, re-prompting until one is given.
    pub fn ask_selection(&mut self, count: usize) -> Result<usize> {
        loop {
            let answer = self.read_input()?;
            if answer.is_empty() || !answer.chars().all(|c| c.is_ascii_digit()) {
                self.say("\n   Must enter number.")?;
                continue;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(n),
                _ => self.say("\n   Selection not in appropriate range.")?,
            }
        }
    }

    /// Print the input marker and read a line. End of input is an error here
    /// so dialogs unwind; [`Session::run`] turns it into a clean exit.
    fn read_input(&mut self) -> Result<String> {
        let marker = self.config.palette.prompt_marker();
        let out = self.terminal.writer();
        write!(out, "{}", marker)?;
        out.flush()?;
        self.terminal.read_line()?.ok_or_else(end_of_input)
    }

    fn print_listing(&mut self, names: &[String]) -> io::Result<()> {
        self.blank()?;
        for (i, name) in names.iter().enumerate() {
            self.say(&format!("   {}. {}", i + 1, name))?;
        }
        self.blank()
    }

    fn none_located(&self, kind: &str, dir: &Path) -> String {
        format!(
            "\n   No {} located in {}",
            kind,
            self.config.palette.config(&dir.display().to_string())
        )
    }

    fn saved_to(&self, dir_label: &str, file_name: &str) -> String {
        format!(
            "\n   Saved to {}/{}",
            self.config.palette.config(dir_label),
            file_name
        )
    }

    fn report(&mut self, err: &Error) -> io::Result<()> {
        log::warn!("{}", err);
        let tag = self.config.palette.error(err.tag());
        self.say(&format!("\n   {}: {}", tag, err))
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.terminal.writer(), "{}", text)
    }

    fn blank(&mut self) -> io::Result<()> {
        writeln!(self.terminal.writer())
    }

    fn centered(&mut self, text: &str) -> io::Result<()> {
        let line = center(text, self.config.term_width);
        self.say(&line)
    }
}
