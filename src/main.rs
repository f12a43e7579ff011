mod common;
mod config;
mod network;
mod ui;

use std::time::Duration;

use clap::Parser;
use common::Channel;
use dotenvy::dotenv;
use network::{ApiClient, ChatWorker};
use tokio::sync::mpsc;
use ui::ChatApp;
use ui::state::ConversationState;

#[derive(Parser)]
#[command(
    name = "support_chat_widget",
    version,
    about = "Desktop chat widget for a remote support assistant"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Backend base URL, overrides config and CHAT_BASE_URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Initial routing channel
    #[arg(long, value_enum, default_value_t = Channel::Chat)]
    channel: Channel,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config).apply_env_overrides();
    if let Some(base_url) = cli.base_url {
        app_config.base_url = base_url;
    }

    // UI -> worker
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // worker -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let client = ApiClient::new(&app_config);
    let poll_interval = app_config.poll_interval_secs.map(Duration::from_secs);
    tokio::spawn(async move {
        ChatWorker::new(client, event_tx, cmd_rx, poll_interval)
            .run()
            .await;
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([420.0, 640.0]),
        ..Default::default()
    };
    let mut event_rx = Some(event_rx);
    let state = ConversationState::new(&app_config, cli.channel);
    let mut state = Some(state);

    log::info!("Chat widget talking to {}", app_config.base_url);

    eframe::run_native(
        "Support Chat",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("ChatApp should only be initialized once");
            let state = state
                .take()
                .expect("ChatApp should only be initialized once");

            Ok(Box::new(ChatApp::new(cc, state, cmd_tx.clone(), event_receiver)))
        }),
    )
}
