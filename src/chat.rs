//! Outbound side of the Telegram Bot API.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardMarkup, KeyboardRemove, MessageId,
    ParseMode,
};
use tracing::debug;

use crate::config::TelegramConfig;
use crate::error::{Error, Result};

/// Chunk size kept below Telegram's 4096 character message limit.
pub const MESSAGE_CHUNK_LEN: usize = 4000;

/// Bot handle whose HTTP client honours the configured timeout and proxy.
pub fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let mut builder =
        reqwest::Client::builder().timeout(Duration::from_secs(config.api_request_timeout));
    if let Some(proxy_url) = &config.proxy_url {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| Error::Config(format!("invalid telegram.proxy_url: {}", e)))?;
        builder = builder.proxy(proxy);
    }
    let client = builder
        .build()
        .map_err(|e| Error::Config(format!("failed to build Telegram HTTP client: {}", e)))?;
    Ok(Bot::with_client(&config.bot_token, client))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub callback_data: String,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Inline button grid: `per_row` options per row, then an optional footer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub options: Vec<MenuOption>,
    pub per_row: usize,
    pub footer: Vec<MenuOption>,
}

impl Menu {
    pub fn new(options: Vec<MenuOption>, per_row: usize) -> Self {
        Self {
            options,
            per_row,
            footer: Vec::new(),
        }
    }

    pub fn with_footer(mut self, option: MenuOption) -> Self {
        self.footer.push(option);
        self
    }

    pub fn rows(&self) -> Vec<Vec<&MenuOption>> {
        let mut rows: Vec<Vec<&MenuOption>> = self
            .options
            .chunks(self.per_row.max(1))
            .map(|row| row.iter().collect())
            .collect();
        if !self.footer.is_empty() {
            rows.push(self.footer.iter().collect());
        }
        rows
    }

    pub fn to_markup(&self) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(self.rows().into_iter().map(|row| {
            row.into_iter()
                .map(|option| {
                    InlineKeyboardButton::callback(
                        option.label.clone(),
                        option.callback_data.clone(),
                    )
                })
                .collect::<Vec<_>>()
        }))
    }
}

/// Where finished reports go.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;

    async fn send_menu(&self, text: &str, menu: &Menu) -> Result<()>;
}

/// Telegram client bound to the one configured chat.
#[derive(Clone)]
pub struct ChatClient {
    bot: Bot,
    chat_id: ChatId,
}

impl ChatClient {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }

    pub async fn send_keyboard(&self, text: &str, keyboard: KeyboardMarkup) -> Result<()> {
        self.bot
            .send_message(self.chat_id, text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    pub async fn remove_keyboard(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.chat_id, text.to_string())
            .reply_markup(KeyboardRemove::new())
            .await?;
        Ok(())
    }

    /// Replaces the text (and buttons) of an earlier message. Whatever does
    /// not fit in one message follows as new messages.
    pub async fn edit(&self, message_id: MessageId, text: &str, menu: Option<&Menu>) -> Result<()> {
        let mut chunks = split_message(text, MESSAGE_CHUNK_LEN).into_iter();
        let first = chunks.next().unwrap_or_default();
        let mut request = self
            .bot
            .edit_message_text(self.chat_id, message_id, first)
            .parse_mode(ParseMode::Html);
        if let Some(menu) = menu {
            request = request.reply_markup(menu.to_markup());
        }
        request.await?;
        for chunk in chunks {
            self.bot
                .send_message(self.chat_id, chunk)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Ok(())
    }

    pub async fn delete(&self, message_id: MessageId) -> Result<()> {
        self.bot.delete_message(self.chat_id, message_id).await?;
        Ok(())
    }

    pub async fn answer_callback(&self, query: &CallbackQuery) -> Result<()> {
        self.bot.answer_callback_query(query.id.clone()).await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for ChatClient {
    async fn send(&self, text: &str) -> Result<()> {
        let chunks = split_message(text, MESSAGE_CHUNK_LEN);
        debug!("Sending {} chunk(s) to chat {}", chunks.len(), self.chat_id.0);
        for chunk in chunks {
            self.bot
                .send_message(self.chat_id, chunk)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Ok(())
    }

    async fn send_menu(&self, text: &str, menu: &Menu) -> Result<()> {
        self.bot
            .send_message(self.chat_id, text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(menu.to_markup())
            .await?;
        Ok(())
    }
}

/// Split long messages for Telegram's length limit, preferring line breaks.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].trim_end_matches('\n').to_string());
        start = actual_end;
    }

    chunks
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::Uri;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Bot API calls seen by [`telegram_stub`], as (method, JSON body).
    pub(crate) type Requests = Arc<Mutex<Vec<(String, String)>>>;

    /// A bot pointed at a local Bot API server that accepts every call.
    pub(crate) async fn telegram_stub() -> (Bot, Requests) {
        telegram_stub_rejecting("").await
    }

    /// Like [`telegram_stub`], but `rejected` calls fail with a 400.
    pub(crate) async fn telegram_stub_rejecting(rejected: &'static str) -> (Bot, Requests) {
        let requests: Requests = Default::default();
        let recorded = requests.clone();
        let app = Router::new().fallback(move |uri: Uri, body: String| {
            let recorded = recorded.clone();
            async move {
                // teloxide puts PascalCase method names in the URL (Telegram
                // matches them case-insensitively); record the documented
                // camelCase spelling.
                let raw = uri.path().rsplit('/').next().unwrap_or_default();
                let mut chars = raw.chars();
                let method: String = match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                };
                if method == rejected {
                    recorded.lock().unwrap().push((method, body));
                    return Json(json!({
                        "ok": false,
                        "error_code": 400,
                        "description": "Bad Request: query is too old"
                    }));
                }
                let result = match method.as_str() {
                    "sendMessage" | "editMessageText" => json!({
                        "message_id": 7,
                        "date": 1700000000,
                        "chat": { "id": 42, "first_name": "Owner", "type": "private" },
                        "text": "ok"
                    }),
                    _ => json!(true),
                };
                recorded.lock().unwrap().push((method, body));
                Json(json!({ "ok": true, "result": result }))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let url = reqwest::Url::parse(&format!("http://{}/", addr)).unwrap();
        (Bot::new("123:abc").set_api_url(url), requests)
    }

    pub(crate) fn methods(requests: &Requests) -> Vec<String> {
        requests
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    #[test]
    fn test_short_message_is_single_chunk() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
    }

    #[test]
    fn test_split_prefers_line_breaks() {
        let text = "line one\nline two\nline three";
        let chunks = split_message(text, 12);
        assert_eq!(chunks, vec!["line one", "line two", "line three"]);
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let text = "🟢".repeat(50);
        let chunks = split_message(&text, 30);
        assert!(chunks.iter().all(|c| c.len() <= 30));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_menu_rows_with_footer() {
        let options = (1..=5)
            .map(|i| MenuOption::new(format!("c{}", i), format!("category/{}", i)))
            .collect();
        let menu = Menu::new(options, 2).with_footer(MenuOption::new("✅ OK", "categories/OK"));
        let rows = menu.rows();
        let sizes: Vec<usize> = rows.iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1, 1]);
        assert_eq!(rows[3][0].callback_data, "categories/OK");
    }

    #[test]
    fn test_menu_zero_per_row_falls_back_to_one() {
        let menu = Menu::new(vec![MenuOption::new("a", "a"), MenuOption::new("b", "b")], 0);
        assert_eq!(menu.rows().len(), 2);
    }

    #[test]
    fn test_build_bot_rejects_bad_proxy() {
        let config = TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: 1,
            proxy_url: Some("::not a url::".to_string()),
            api_request_timeout: 60,
        };
        assert!(matches!(build_bot(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_rejected_send_is_delivery_error() {
        let app = Router::new().fallback(|| async {
            Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            }))
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = reqwest::Url::parse(&format!("http://{}/", addr)).unwrap();
        let chat = ChatClient::new(Bot::new("123:abc").set_api_url(url), 42);
        let err = chat.send("report").await.unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_long_edit_sends_overflow() {
        let (bot, requests) = telegram_stub().await;
        let chat = ChatClient::new(bot, 42);
        let mut text: String = (0..300)
            .map(|i| format!("Payee {}: -1.00\n", i))
            .collect();
        text.push_str("Total: -300.00");
        let menu = Menu::new(vec![MenuOption::new("✅ OK", "account/OK")], 1);

        chat.edit(MessageId(7), &text, Some(&menu)).await.unwrap();

        assert_eq!(methods(&requests), vec!["editMessageText", "sendMessage"]);
        let requests = requests.lock().unwrap();
        assert!(requests[0].1.contains("account/OK"));
        assert!(requests[1].1.contains("Total: -300.00"));
    }

    #[tokio::test]
    async fn test_short_edit_is_single_call() {
        let (bot, requests) = telegram_stub().await;
        let chat = ChatClient::new(bot, 42);
        chat.edit(MessageId(7), "Total: 0.00", None).await.unwrap();
        assert_eq!(methods(&requests), vec!["editMessageText"]);
    }
}
