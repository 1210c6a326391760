use std::path::PathBuf;

use crate::expansion::PanelMode;
use crate::theme::Theme;

/// Host commands typed after `:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write,
    WriteAs(PathBuf),
    WriteQuit,
    Quit,
    ForceQuit,
    Undo,
    Redo,
    Revert,
    Mode(PanelMode),
    Theme(Theme),
    ThemeList,
    Unknown(String),
}

impl Command {
    /// Parse the text after the leading `:`. Blank input is no command.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(path) = trimmed.strip_prefix("w ") {
            let path = path.trim();
            if !path.is_empty() {
                return Some(Command::WriteAs(PathBuf::from(path)));
            }
        }

        if let Some(mode) = trimmed.strip_prefix("mode ") {
            return Some(match mode.parse::<PanelMode>() {
                Ok(mode) => Command::Mode(mode),
                Err(_) => Command::Unknown(trimmed.to_string()),
            });
        }

        if let Some(name) = trimmed.strip_prefix("theme ") {
            return Some(match Theme::by_name(name) {
                Some(theme) => Command::Theme(theme),
                None => Command::Unknown(trimmed.to_string()),
            });
        }

        match trimmed {
            "w" => Some(Command::Write),
            "wq" | "x" => Some(Command::WriteQuit),
            "q" => Some(Command::Quit),
            "q!" => Some(Command::ForceQuit),
            "u" | "undo" => Some(Command::Undo),
            "redo" => Some(Command::Redo),
            "e!" => Some(Command::Revert),
            "theme" | "themes" => Some(Command::ThemeList),
            _ => Some(Command::Unknown(trimmed.to_string())),
        }
    }
}
