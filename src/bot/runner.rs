//! Long polling loop dispatching the commands

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::api::{BotApi, BotError, Update};
use super::command::Command;
use crate::config::{BotConfig, BotOptions};

/// Pause before polling again after a failure
const RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct BotRunner<A>
where
    A: BotApi,
{
    api: A,
    webapp_url: String,
    poll_timeout_secs: u64,
    username: Option<String>,
    offset: i64,
}

impl<A> BotRunner<A>
where
    A: BotApi,
{
    pub fn new(api: A, config: &BotConfig, options: &BotOptions) -> Self {
        Self {
            api,
            webapp_url: config.webapp_url.clone(),
            poll_timeout_secs: options.poll_timeout_secs,
            username: None,
            offset: 0,
        }
    }

    /// Identify the bot, so commands addressed to it are recognized
    pub fn launch(&mut self) -> Result<(), BotError> {
        let me = self.api.get_me()?;
        info!(id = me.id, username = ?me.username, "Bot is running...");
        self.username = me.username;

        Ok(())
    }

    /// Poll and answer until `stop` is raised
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), BotError> {
        self.launch()?;

        while !stop.load(Ordering::SeqCst) {
            if let Err(e) = self.poll() {
                warn!("Failed on fetch the updates: {}", e);
                thread::sleep(RETRY_DELAY);
            }
        }

        info!("Bot stopped");

        Ok(())
    }

    /// One updates request, answering every command received
    pub fn poll(&mut self) -> Result<usize, BotError> {
        let updates = self.api.get_updates(self.offset, self.poll_timeout_secs)?;
        let mut answered = 0;

        for update in &updates {
            self.offset = self.offset.max(update.update_id + 1);

            if self.handle_update(update) {
                answered += 1;
            }
        }

        Ok(answered)
    }

    /// Answer the update command, if any
    pub fn handle_update(&self, update: &Update) -> bool {
        let Some(message) = &update.message else {
            return false;
        };
        let Some(text) = &message.text else {
            return false;
        };
        let Some(command) = Command::parse(text, self.username.as_deref()) else {
            return false;
        };

        debug!(chat = message.chat.id, ?command, "Command received");

        let reply = command.reply(&self.webapp_url).to_chat(message.chat.id);
        match self.api.send_message(&reply) {
            Ok(_) => true,
            Err(e) => {
                warn!(chat = message.chat.id, ?command, "Failed on reply: {}", e);
                false
            }
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}
