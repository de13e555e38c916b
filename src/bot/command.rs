//! Bot commands and their static replies

use super::api::{InlineKeyboardButton, InlineKeyboardMarkup, SendMessage, WebAppInfo};

const START_TEXT: &str = "Welcome to Speed Tracker! 🚀\nUse /help to see available commands.";
const HELP_TEXT: &str = "Available commands:\n\
    /start - Start the bot\n\
    /help - Show this help message\n\
    /webapp - Open the Mini App";
const WEBAPP_TEXT: &str = "Open Web App";
const WEBAPP_BUTTON: &str = "Open App";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    WebApp,
}

impl Command {
    /// Command of a message text, eg.: `/help` or `/webapp@SpeedBot now`.
    ///
    /// A command addressed to another bot is not ours.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;

        let name = match name.split_once('@') {
            Some((name, target)) => match bot_username {
                Some(username) if username.eq_ignore_ascii_case(target) => name,
                _ => return None,
            },
            None => name,
        };

        match name {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "webapp" => Some(Command::WebApp),
            _ => None,
        }
    }

    pub fn reply(&self, webapp_url: &str) -> Reply {
        match self {
            Command::Start => Reply::text(START_TEXT),
            Command::Help => Reply::text(HELP_TEXT),
            Command::WebApp => Reply {
                text: WEBAPP_TEXT.to_string(),
                keyboard: Some(InlineKeyboardMarkup {
                    inline_keyboard: vec![vec![InlineKeyboardButton {
                        text: WEBAPP_BUTTON.to_string(),
                        web_app: WebAppInfo {
                            url: webapp_url.to_string(),
                        },
                    }]],
                }),
            },
        }
    }
}

/// Answer to a command
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            keyboard: None,
        }
    }

    pub fn to_chat(self, chat_id: i64) -> SendMessage {
        SendMessage {
            chat_id,
            text: self.text,
            reply_markup: self.keyboard,
        }
    }
}
