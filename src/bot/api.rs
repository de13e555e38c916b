//! Telegram Bot API client

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Envelope of every Bot API answer
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, BotError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Api(
                self.description
                    .unwrap_or_else(|| "request not succeeded".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebAppInfo {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub web_app: WebAppInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Bot API operations used by the relay
pub trait BotApi {
    fn get_me(&self) -> Result<User, BotError>;

    /// Long poll the updates starting at `offset`
    fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, BotError>;

    fn send_message(&self, message: &SendMessage) -> Result<Message, BotError>;
}

/// Bot API over HTTPS
pub struct TelegramApi {
    client: reqwest::blocking::Client,
    base: String,
}

impl TelegramApi {
    /// Client whose requests outlive the long polling timeout
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self, BotError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()
            .map_err(|e| BotError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: format!("{}/bot{}", API_URL, token),
        })
    }

    fn call<B, T>(&self, method: &str, body: &B) -> Result<T, BotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()
            // the url carries the token
            .map_err(|e| BotError::Http(format!("{} failed: {}", method, e.without_url())))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().map_err(|e| {
            BotError::Http(format!("{} answered {}: {}", method, status, e.without_url()))
        })?;

        envelope.into_result()
    }
}

impl BotApi for TelegramApi {
    fn get_me(&self) -> Result<User, BotError> {
        self.call("getMe", &serde_json::json!({}))
    }

    fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, BotError> {
        let body = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };

        self.call("getUpdates", &body)
    }

    fn send_message(&self, message: &SendMessage) -> Result<Message, BotError> {
        self.call("sendMessage", message)
    }
}
