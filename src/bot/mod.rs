//! Telegram bot opening the speed tracker as a mini app

mod api;
mod command;
mod runner;

pub use api::{
    ApiResponse, BotApi, BotError, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    SendMessage, TelegramApi, Update, User, WebAppInfo,
};
pub use command::{Command, Reply};
pub use runner::BotRunner;
