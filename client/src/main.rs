use std::env;

use client::{RoomController, SessionStore, WsChannel};
use client::channel::Channel;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let url = env::var("SERVER_URL").unwrap_or_else(|_| "ws://127.0.0.1:3000/ws".to_string());
    let data_dir = env::var("DATA_DIR").map_or_else(|_| env::temp_dir(), Into::into);
    let mut hints = SessionStore::load(data_dir.join("session.json")).await;
    let session = hints.session();

    let channel = WsChannel::connect(&url).await.expect("connect");
    let mut pushes = channel.subscribe();
    let mut controller = RoomController::new(channel, session);

    match env::var("ROOM") {
        Ok(room) => controller.join(&room).await.expect("join room"),
        Err(_) => {
            let room = Uuid::new_v4().to_string()[..8].to_string();
            controller.create(&room).await.expect("create room");
            tracing::info!(room = controller.room_id(), "created room");
        }
    }
    hints.remember_join(
        controller.room_id(),
        &controller.state().host,
        &controller.state().roles,
    );
    hints.save().await;

    while let Ok(push) = pushes.recv().await {
        controller.handle_push(push);
        for line in controller.visible_logs() {
            tracing::debug!(%line, "log");
        }
        for client::Notice(text) in controller.drain_notices() {
            tracing::info!(%text, "notice");
        }
    }
}
