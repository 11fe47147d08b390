use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::mpsc::{self, Receiver, UnboundedReceiver, UnboundedSender};

use crate::backend::{BackendClient, ControlCommand, ControlOutcome};
use crate::channel::{self, ChannelEvent, WsConnector};
use crate::errors::DashboardError;
use crate::i18n::LocaleTable;

#[derive(Clone, Debug)]
pub enum TranslationSource {
    /// `GET /static/translations.json` from the backend.
    Backend,
    File(PathBuf),
}

/// Results of fire-and-forget requests.
#[derive(Debug)]
pub enum BackendEvent {
    Translations(Result<LocaleTable, DashboardError>),
    Control(ControlOutcome),
}

/// The UI side of the background runtime. Dropping `inbox` tears the runtime down.
pub struct RuntimeHandles {
    pub inbox: Receiver<ChannelEvent>,
    pub backend_events: UnboundedReceiver<BackendEvent>,
    pub commands: UnboundedSender<ControlCommand>,
}

/// Starts the push channel, the translation load and the control-request worker on a dedicated
/// thread running a current-thread tokio runtime.
pub fn spawn_backend(
    server_url: &str,
    translations: TranslationSource,
    reconnect_delay: Duration,
) -> Result<RuntimeHandles, DashboardError> {
    let connector = WsConnector::new(server_url)?;
    let client = BackendClient::new(server_url);
    let (inbox_tx, inbox_rx) = channel::inbox();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();

    info!("Connecting to {}", connector.url());
    thread::Builder::new()
        .name("backend".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Could not build tokio runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(async move {
                tokio::spawn(load_translations(
                    client.clone(),
                    translations,
                    events_tx.clone(),
                    reconnect_delay,
                ));
                tokio::spawn(control_worker(client, commands_rx, events_tx));
                channel::run_channel(connector, inbox_tx, reconnect_delay).await;
                info!("Dashboard closed, stopping push channel");
            });
        })
        .map_err(|e| DashboardError::RuntimeStart { source: e })?;

    Ok(RuntimeHandles {
        inbox: inbox_rx,
        backend_events: events_rx,
        commands: commands_tx,
    })
}

async fn load_translations(
    client: BackendClient,
    source: TranslationSource,
    events: UnboundedSender<BackendEvent>,
    retry_delay: Duration,
) {
    let fetch = || {
        let client = client.clone();
        let source = source.clone();
        async move {
            match source {
                TranslationSource::Backend => client.fetch_translations().await,
                TranslationSource::File(path) => LocaleTable::from_file(&path),
            }
        }
    };
    let attempts = retry_until_loaded(fetch, &events, retry_delay).await;
    debug!("Translation loading finished after {} attempt(s)", attempts);
}

/// Fetches the locale table until one loads or the UI goes away, waiting `retry_delay` between
/// attempts. Every result is reported. Returns the number of attempts made.
pub async fn retry_until_loaded<F, Fut>(
    mut fetch: F,
    events: &UnboundedSender<BackendEvent>,
    retry_delay: Duration,
) -> u32
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<LocaleTable, DashboardError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let table = fetch().await;
        let loaded = table.is_ok();
        if events.send(BackendEvent::Translations(table)).is_err() || loaded {
            return attempts;
        }
        tokio::time::sleep(retry_delay).await;
    }
}

/// Every command runs as its own task; the UI never waits on a request.
async fn control_worker(
    client: BackendClient,
    mut commands: UnboundedReceiver<ControlCommand>,
    events: UnboundedSender<BackendEvent>,
) {
    while let Some(command) = commands.recv().await {
        let client = client.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let outcome = client.execute(command).await;
            let _ = events.send(BackendEvent::Control(outcome));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn table() -> LocaleTable {
        LocaleTable::from_json(r#"{"en": {"title": "Card Sort Control"}}"#).unwrap()
    }

    fn unreachable_backend() -> DashboardError {
        DashboardError::TranslationLoad {
            reason: "connection refused".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_translations_retried_until_loaded() {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut failures = 2;
        let fetch = || {
            let result = if failures > 0 {
                failures -= 1;
                Err(unreachable_backend())
            } else {
                Ok(table())
            };
            async move { result }
        };

        let started = Instant::now();
        let attempts = retry_until_loaded(fetch, &events_tx, Duration::from_secs(5)).await;
        assert_eq!(attempts, 3);
        assert!(started.elapsed() >= Duration::from_secs(10));

        let mut results = Vec::new();
        while let Ok(BackendEvent::Translations(result)) = events_rx.try_recv() {
            results.push(result);
        }
        assert_eq!(results.len(), 3);
        assert!(results[0].is_err());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap(), &table());
    }

    #[tokio::test(start_paused = true)]
    async fn test_translation_retry_stops_without_listener() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        drop(events_rx);
        let attempts = retry_until_loaded(
            || async { Err(unreachable_backend()) },
            &events_tx,
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(attempts, 1);
    }
}
