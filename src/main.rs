//! Nocturne - headless player
//!
//! Plays the URL given on the command line (or a random fallback track),
//! logging progress until the track ends or Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nocturne::api::{Gateway, RestGateway, Track, UserId};
use nocturne::audio::{PlaybackEngine, RodioBackend};
use nocturne::database::Database;
use nocturne::features::{BackendKind, Settings};
use nocturne::i18n::Locale;
use nocturne::session::{NotificationKind, NotificationReceiver, Notifier, PlayerSession};
use nocturne::utils::format_time;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load();
    let target = std::env::args().nth(1).map(|url| Track::from_url(&url));

    let mut client = reqwest::Client::builder().timeout(Duration::from_secs(60));
    if let Some(url) = settings.network.proxy_url() {
        client = client.proxy(reqwest::Proxy::all(&url)?);
    }
    let client = client.build()?;

    match settings.gateway.backend {
        BackendKind::Local => {
            let path = settings.gateway.database_path();
            info!(path = %path.display(), "Opening local database");
            let db = Database::new(&path).await?;
            if let Some(name) = &settings.gateway.local_user {
                let user = UserId::new(name.as_str());
                db.register_user(&user, name).await?;
                db.sign_in_as(&user);
            }
            run(db, client, &settings, target).await
        }
        BackendKind::Remote => {
            let gateway = RestGateway::new(
                &settings.gateway.url,
                &settings.gateway.anon_key,
                settings.network.proxy_url(),
            )?;
            if let (Some(email), Some(password)) =
                (&settings.gateway.email, &settings.gateway.password)
            {
                // Anonymous playback still works without a session
                if let Err(e) = gateway.sign_in(email, password).await {
                    warn!(error = %e, "Sign in failed, continuing anonymously");
                }
            }
            run(gateway, client, &settings, target).await
        }
    }
}

async fn run<G: Gateway>(
    gateway: G,
    client: reqwest::Client,
    settings: &Settings,
    target: Option<Track>,
) -> Result<()> {
    let backend = RodioBackend::new(client)?;
    let engine = Arc::new(PlaybackEngine::new(backend, settings.playback.default_volume));
    let (notifier, mut notifications) = Notifier::channel(Locale::new(settings.language()));
    let session = PlayerSession::new(
        Arc::new(gateway),
        engine,
        notifier,
        settings.playback.fallback_tracks.clone(),
    );

    let poller = session.spawn_poller(Duration::from_millis(settings.playback.poll_interval_ms));

    let started = match target {
        Some(track) => session.play_track(track).await,
        None => session.next().await,
    };

    if started.is_ok() {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut ticker = tokio::time::interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let state = session.state();
                    if let Some(track) = &state.current_track {
                        info!(
                            "{} - {} [{} / {}]",
                            track.artist,
                            track.title,
                            format_time(state.current_time),
                            format_time(state.duration)
                        );
                    }
                    if !state.playing {
                        break;
                    }
                }
                _ = &mut ctrl_c => {
                    info!("Interrupted");
                    break;
                }
            }
            drain(&mut notifications);
        }
    }

    drain(&mut notifications);
    poller.stop().await;
    session.shutdown().await;
    info!(history_failures = session.history_failures(), "Session closed");
    Ok(())
}

fn drain(notifications: &mut NotificationReceiver) {
    while let Ok(notification) = notifications.try_recv() {
        match notification.kind {
            NotificationKind::Error => warn!("{}: {}", notification.title, notification.message),
            _ => info!("{}: {}", notification.title, notification.message),
        }
    }
}
