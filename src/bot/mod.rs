pub mod keyboards;

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::chat::{ChatClient, Menu, Messenger};
use crate::config::Config;
use crate::error::Result;
use crate::firefly::{AccountType, Ledger};
use crate::report::{self, views, ReportRequest};

use keyboards::{Callback, Command};

const LEDGER_FAILURE: &str = "⚠️ Could not load data from Firefly, see the bot log.";

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub ledger: Arc<dyn Ledger>,
    pub chat: ChatClient,
    /// Held for the whole of a report run.
    pub report_gate: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config, ledger: Arc<dyn Ledger>, chat: ChatClient) -> Self {
        Self {
            config,
            ledger,
            chat,
            report_gate: Mutex::new(()),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Long-poll updates until Ctrl-C. Only the configured chat is served.
pub async fn run(bot: Bot, state: Arc<AppState>) {
    info!("Starting Telegram bot...");

    let chat_id = state.config.telegram.chat_id;

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter(move |msg: Message| is_configured_chat(Some(msg.chat.id), chat_id))
                .endpoint(handle_message),
        )
        .branch(
            Update::filter_callback_query()
                .filter(move |q: CallbackQuery| {
                    is_configured_chat(q.message.as_ref().map(|m| m.chat().id), chat_id)
                })
                .endpoint(handle_callback),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Ignored update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram bot stopped");
}

/// Updates without a chat, or from any other chat, are dropped.
fn is_configured_chat(chat: Option<ChatId>, configured: i64) -> bool {
    chat.is_some_and(|chat| chat.0 == configured)
}

async fn handle_message(msg: Message, state: Arc<AppState>) -> Result<()> {
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };
    let command = match Command::parse(text) {
        Some(command) => command,
        None => return Ok(()),
    };

    let user_id = msg.from.as_ref().map(|user| user.id.0);
    info!("Command {:?} from user {:?}", command, user_id);
    run_command(&state, command).await
}

async fn run_command(state: &AppState, command: Command) -> Result<()> {
    let ledger = state.ledger.as_ref();
    match command {
        Command::Start => {
            state
                .chat
                .send_keyboard("Hi", keyboards::main_keyboard())
                .await
        }
        Command::Stop => state.chat.remove_keyboard("Bye").await,
        Command::Reports => {
            let menu = keyboards::reports_menu(state.config.day_period);
            state.chat.send_menu("Choose type of report", &menu).await
        }
        Command::Accounts => {
            let kind = AccountType::Asset;
            let view = views::accounts_view(ledger, kind).await;
            show(state, view, Some(keyboards::accounts_menu(kind))).await
        }
        Command::Transactions => {
            let date = today();
            let view = views::transactions_view(ledger, date).await;
            show(state, view, Some(keyboards::transactions_menu(date))).await
        }
        Command::Budgets => {
            let view = views::budgets_view(ledger, today()).await;
            show(state, view, None).await
        }
        Command::Categories => match ledger.list_categories().await {
            Ok(categories) => {
                let menu =
                    keyboards::categories_menu(&categories, state.config.categories_in_row);
                state.chat.send_menu("Categories", &menu).await
            }
            Err(e) => {
                error!("Failed to list categories: {}", e);
                state.chat.send(LEDGER_FAILURE).await
            }
        },
    }
}

async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> Result<()> {
    let data = q.data.clone().unwrap_or_default();
    info!("Callback {:?} from user {}", data, q.from.id.0);

    // A stale query cannot be answered, the button still gets handled
    if let Err(e) = state.chat.answer_callback(&q).await {
        warn!("Failed to answer callback query: {}", e);
    }

    let message_id = match q.message.as_ref() {
        Some(message) => message.id(),
        None => return Ok(()),
    };
    run_callback(&state, message_id, &data).await
}

/// Acts on a button pressed under `message_id`.
async fn run_callback(state: &AppState, message_id: MessageId, data: &str) -> Result<()> {
    let callback = match Callback::parse(data) {
        Some(callback) => callback,
        None => {
            warn!("Unknown callback data: {:?}", data);
            return Ok(());
        }
    };

    let ledger = state.ledger.as_ref();
    match callback {
        Callback::Report(kind) => {
            let request = ReportRequest::for_kind(kind, today(), &state.config);
            run_report(state, &request).await?;
            state.chat.delete(message_id).await
        }
        Callback::Account(kind) => {
            let view = views::accounts_view(ledger, kind).await;
            replace(state, message_id, view, keyboards::accounts_menu(kind)).await
        }
        Callback::TransactionsOn(date) => {
            let view = views::transactions_view(ledger, date).await;
            replace(state, message_id, view, keyboards::transactions_menu(date)).await
        }
        Callback::Category(id) => {
            let view = category_view(ledger, &id).await;
            replace(state, message_id, view, keyboards::categories_menu(&[], 1)).await
        }
        Callback::AccountsOk | Callback::TransactionsOk | Callback::CategoriesOk => {
            state.chat.delete(message_id).await
        }
    }
}

async fn category_view(ledger: &dyn Ledger, id: &str) -> Result<String> {
    let categories = ledger.list_categories().await?;
    match categories.into_iter().find(|category| category.id == id) {
        Some(category) => views::category_transactions_view(ledger, &category.name, today()).await,
        None => Ok(format!("Category {} no longer exists.", id)),
    }
}

/// Builds and sends one report while holding the report gate.
async fn run_report(state: &AppState, request: &ReportRequest) -> Result<()> {
    let _guard = state.report_gate.lock().await;
    info!("Building {} report: {}", request.kind.as_str(), request.header);
    match report::generate(request, state.ledger.as_ref()).await {
        Ok(text) => state.chat.send(&text).await,
        Err(e) => {
            error!("Failed to build {} report: {}", request.kind.as_str(), e);
            state.chat.send(LEDGER_FAILURE).await
        }
    }
}

async fn show(state: &AppState, view: Result<String>, menu: Option<Menu>) -> Result<()> {
    match (view, menu) {
        (Ok(text), Some(menu)) => state.chat.send_menu(&text, &menu).await,
        (Ok(text), None) => state.chat.send(&text).await,
        (Err(e), _) => {
            error!("Failed to load view: {}", e);
            state.chat.send(LEDGER_FAILURE).await
        }
    }
}

async fn replace(
    state: &AppState,
    message_id: MessageId,
    view: Result<String>,
    menu: Menu,
) -> Result<()> {
    match view {
        Ok(text) => state.chat.edit(message_id, &text, Some(&menu)).await,
        Err(e) => {
            error!("Failed to load view: {}", e);
            state.chat.send(LEDGER_FAILURE).await
        }
    }
}
