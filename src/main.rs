//! MiniBot - Twitch chat bot
//!
//! Connects to Twitch IRC, runs every chat line through the script
//! pipeline and posts the replies back to the channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::signal;
use tracing::{debug, error, info, warn};

use minibot::audio::{run_player, AudioQueue};
use minibot::common::OutgoingMessage;
use minibot::config::types::Config;
use minibot::config::{env::get_config_path, load_and_validate};
use minibot::dispatch::{ChannelBundle, Dispatcher, IgnoreList, MessageFilter};
use minibot::scripts::markov::{BrainStore, MarkovEngine};
use minibot::scripts::{
    AskAiScript, ClapThatScript, GoogleTranslator, HelixStreamStatus, ManglerScript,
    NlpCloudTagger, OpenAiCompletion, Script, ScriptKind,
    SoundAlertScript, SyllableSplitter, TranslateScript, WalkOnScript, WeatherScript,
    WordMangler, WttrWeather,
};
use minibot::twitch::{Disconnect, TwitchClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("MiniBot v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        error!("See minibot.conf.example for reference.");
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Bot account: {}", config.twitch.username);
    info!("  Channels: {}", config.twitch.channels.join(", "));
    info!("  Server: {}:{}", config.twitch.host(), config.twitch.port());

    let channels = ChannelBundle::new();
    let shutdown_tx = channels.control.shutdown_tx;

    // ============================================================
    // Build scripts
    // ============================================================
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

    let (audio_queue, audio_rx) = AudioQueue::channel();
    let audio_task = tokio::spawn(run_player(
        audio_rx,
        config.sound_alerts().player_command(),
        channels.transport.shutdown_rx.clone(),
    ));

    let markov = Arc::new(MarkovEngine::new(
        BrainStore::new(config.markov().brain_dir()),
        config.markov().generate_every(),
        config.markov().max_words(),
    ));
    info!("  Brain directory: {}", markov.store().dir().display());
    for channel in &config.twitch.channels {
        markov.set_channel(channel).await;
    }

    let scripts = build_scripts(&config, &http, audio_queue, markov);
    let enabled: Vec<ScriptKind> = ScriptKind::ALL
        .into_iter()
        .filter(|kind| config.scripts().is_enabled(kind.name()))
        .collect();
    for kind in &enabled {
        info!("  Script enabled: {}", kind);
    }

    let filter = MessageFilter::new(config.blocked_patterns());
    if filter.has_patterns() {
        info!("  Blocked patterns: {}", config.blocked_patterns().len());
    }

    let dispatcher = Arc::new(Dispatcher::new(
        config.twitch.username.clone(),
        scripts,
        enabled,
        IgnoreList::new(config.ignored_usernames()),
        filter,
    ));

    // ============================================================
    // Dispatch task: one spawned handler per chat line
    // ============================================================
    let dispatch_task = {
        let mut inbound_rx = channels.dispatch.inbound_rx;
        let outbound_tx = channels.dispatch.outbound_tx;
        tokio::spawn(async move {
            while let Some(event) = inbound_rx.recv().await {
                let dispatcher = dispatcher.clone();
                let outbound_tx = outbound_tx.clone();
                tokio::spawn(async move {
                    for reply in dispatcher.dispatch(&event).await {
                        let outgoing = OutgoingMessage::new(event.channel.as_str(), reply);
                        if let Err(e) = outbound_tx.send(outgoing) {
                            warn!("Failed to queue reply: {}", e);
                        }
                    }
                });
            }
            info!("Dispatch task ended");
        })
    };

    // ============================================================
    // Start Twitch client in separate task
    // ============================================================

    /// Create an exponential backoff iterator for IRC reconnection.
    /// 5s initial, 5min max, factor 1.5, with jitter, unlimited retries.
    fn irc_backoff() -> impl Iterator<Item = Duration> {
        use backon::BackoffBuilder;

        backon::ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(5))
            .with_max_delay(Duration::from_secs(300))
            .with_factor(1.5)
            .with_jitter()
            .without_max_times()
            .build()
    }

    let twitch_config = config.twitch.clone();
    let transport_channels = channels.transport;

    let mut twitch_task = tokio::spawn(async move {
        let mut client = TwitchClient::new(twitch_config, transport_channels);
        let mut backoff = irc_backoff();

        loop {
            if *client.channels.shutdown_rx.borrow() {
                info!("Shutdown signal detected, stopping reconnection loop");
                break;
            }

            match client.run().await {
                Ok(Disconnect::Shutdown) => break,
                Ok(Disconnect::Reconnect) => {
                    info!("Twitch client disconnected");
                    backoff = irc_backoff();
                }
                Err(e) => error!("Twitch client error: {}", e),
            }

            let delay = backoff.next().unwrap_or(Duration::from_secs(300));
            info!("Reconnecting in {:.1} seconds...", delay.as_secs_f64());

            // Wait for delay OR shutdown signal
            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                changed = client.channels.shutdown_rx.changed() => {
                    if changed.is_err() || *client.channels.shutdown_rx.borrow() {
                        info!("Shutdown signal received during backoff");
                        break;
                    }
                }
            }
        }
    });

    // ============================================================
    // Run until a signal or a task exits
    // ============================================================
    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - leaving chat...");
            true
        }
        _ = &mut twitch_task => false,
        _ = dispatch_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (client already exited): {}", e);
        }
        let timeout = Duration::from_secs(5);
        match tokio::time::timeout(timeout, twitch_task).await {
            Ok(Ok(())) => info!("Twitch client closed gracefully"),
            Ok(Err(e)) => warn!("Twitch client task panicked: {}", e),
            Err(_) => warn!("Twitch client shutdown timed out"),
        }
    } else if let Err(e) = shutdown_tx.send(true) {
        debug!("Shutdown channel closed: {}", e);
    }

    if tokio::time::timeout(Duration::from_secs(2), audio_task).await.is_err() {
        debug!("Audio player still busy at exit");
    }

    info!("Exiting...");
    Ok(())
}

/// Instantiate every script that can be built from the config.
///
/// Scripts are registered even when toggled off so they can be enabled at
/// runtime.
fn build_scripts(
    config: &Config,
    http: &Client,
    audio_queue: AudioQueue,
    markov: Arc<MarkovEngine>,
) -> Vec<Script> {
    let mut scripts = Vec::new();

    scripts.push(Script::AskAi(AskAiScript::new(Arc::new(
        OpenAiCompletion::new(http.clone(), &config.ask_ai()),
    ))));
    scripts.push(Script::Weather(WeatherScript::new(Arc::new(WttrWeather::new(
        http.clone(),
        config.weather().format(),
    )))));
    scripts.push(Script::Translate(TranslateScript::new(
        Arc::new(GoogleTranslator::new(http.clone())),
        config.translate().target_language(),
    )));

    let mangler = config.mangler();
    let splitter = SyllableSplitter::from_file(mangler.dictionary_path());
    if !splitter.has_dictionary() {
        warn!("Mangler running without a pronunciation dictionary");
    }
    scripts.push(Script::Mangler(ManglerScript::new(
        WordMangler::new(splitter),
        mangler.reply_chance_percent(),
        mangler.syllable_chance(),
        mangler.replacement_word(),
    )));

    let clap = config.clap_that();
    scripts.push(Script::ClapThat(ClapThatScript::new(
        Arc::new(NlpCloudTagger::new(
            http.clone(),
            clap.nlp_api_key(),
            clap.nlp_model(),
        )),
        clap.reply_chance_percent(),
    )));

    scripts.push(Script::Markov(markov));

    scripts.push(Script::SoundAlerts(SoundAlertScript::new(
        config.sound_alerts().mappings(),
        audio_queue.clone(),
    )));
    scripts.push(Script::WalkOn(Arc::new(WalkOnScript::new(
        config.walk_on().mappings(),
        Arc::new(HelixStreamStatus::new(
            http.clone(),
            config.twitch.client_id(),
            config.twitch.bearer_token(),
        )),
        audio_queue,
    ))));

    scripts
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
