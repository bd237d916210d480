//! Terminal rendering of page events, plus report downloads on navigation.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use client_core::{ChartDeskClient, ClientEvent, FetchedResource};
use tokio::sync::{broadcast, oneshot};
use tracing::{error, info, warn};

pub fn describe(event: &ClientEvent) -> Option<String> {
    match event {
        ClientEvent::FileSelected(Some(name)) => Some(format!("Selected file: {name}")),
        ClientEvent::FileSelected(None) => Some("No file selected".to_string()),
        ClientEvent::MessageChanged(Some(alert)) => {
            Some(format!("[{}] {}", alert.severity, alert.text))
        }
        ClientEvent::MessageChanged(None) => None,
        ClientEvent::ProgressChanged(progress) if progress.visible => {
            Some(format!("Uploading... {}", progress.label()))
        }
        ClientEvent::ProgressChanged(_) => None,
        ClientEvent::ActionsRevealed => {
            Some("Chart actions available: chart [bar|pie|line], clear, report".to_string())
        }
        ClientEvent::ChartAppended(image) => Some(format!("Chart: {} ({})", image.src, image.alt)),
        ClientEvent::ChartsCleared { removed } => {
            Some(format!("Removed {removed} chart image(s)"))
        }
        ClientEvent::Navigate(location) => Some(format!("Opening {location}")),
    }
}

pub async fn save_download(dir: &Path, resource: &FetchedResource) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create download dir '{}'", dir.display()))?;
    let path = dir.join(&resource.file_name);
    tokio::fs::write(&path, &resource.bytes)
        .await
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(path)
}

/// Prints the event and follows navigation. Returns false only when a report
/// download failed.
async fn handle_event(
    client: &ChartDeskClient,
    download_dir: &Path,
    event: ClientEvent,
) -> bool {
    if let Some(line) = describe(&event) {
        println!("{line}");
    }
    let ClientEvent::Navigate(location) = event else {
        return true;
    };
    let saved = match client.fetch(&location).await {
        Ok(resource) => save_download(download_dir, &resource).await,
        Err(err) => Err(err),
    };
    match saved {
        Ok(path) => {
            info!(location = %location, path = %path.display(), "report downloaded");
            println!("Saved report to {}", path.display());
            true
        }
        Err(err) => {
            error!(location = %location, error = %format!("{err:#}"), "report download failed");
            println!("Could not download {location}");
            false
        }
    }
}

/// Renders events until `shutdown` fires, then drains what is already queued.
/// Returns how many report downloads failed.
pub async fn run(
    client: Arc<ChartDeskClient>,
    mut events: broadcast::Receiver<ClientEvent>,
    download_dir: PathBuf,
    mut shutdown: oneshot::Receiver<()>,
) -> usize {
    let mut failed_downloads = 0;
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if !handle_event(&client, &download_dir, event).await {
                        failed_downloads += 1;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer fell behind page events");
                }
                Err(broadcast::error::RecvError::Closed) => return failed_downloads,
            },
            _ = &mut shutdown => break,
        }
    }
    while let Ok(event) = events.try_recv() {
        if !handle_event(&client, &download_dir, event).await {
            failed_downloads += 1;
        }
    }
    failed_downloads
}

#[cfg(test)]
mod tests {
    use client_core::{Alert, ChartImage, ProgressIndicator};
    use shared::domain::Severity;
    use url::Url;

    use super::*;

    #[test]
    fn describes_alerts_with_severity() {
        let event = ClientEvent::MessageChanged(Some(Alert {
            text: "File uploaded successfully".into(),
            severity: Severity::Success,
        }));
        assert_eq!(
            describe(&event).as_deref(),
            Some("[success] File uploaded successfully")
        );
        assert_eq!(describe(&ClientEvent::MessageChanged(None)), None);
    }

    #[test]
    fn hidden_progress_is_silent() {
        let visible = ClientEvent::ProgressChanged(ProgressIndicator {
            visible: true,
            percent: 42,
        });
        let hidden = ClientEvent::ProgressChanged(ProgressIndicator {
            visible: false,
            percent: 100,
        });
        assert_eq!(describe(&visible).as_deref(), Some("Uploading... 42%"));
        assert_eq!(describe(&hidden), None);
    }

    #[test]
    fn describes_chart_images() {
        let event = ClientEvent::ChartAppended(ChartImage::for_chart("charts/c1.png", "bar"));
        assert_eq!(
            describe(&event).as_deref(),
            Some("Chart: /charts/c1.png (bar chart)")
        );
    }

    #[tokio::test]
    async fn saves_download_under_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested");
        let resource = FetchedResource {
            url: Url::parse("http://localhost/download_report").expect("url"),
            file_name: "report.pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        };

        let path = save_download(&target, &resource).await.expect("save");
        assert_eq!(path, target.join("report.pdf"));
        assert_eq!(std::fs::read(path).expect("read"), b"%PDF-1.4");
    }

    async fn unreachable_server_url() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        Url::parse(&format!("http://{addr}/")).expect("url")
    }

    #[tokio::test]
    async fn failed_report_download_is_counted() {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let dir = tempfile::tempdir().expect("tempdir");
        let client = ChartDeskClient::new(unreachable_server_url().await);
        let (events_tx, events_rx) = broadcast::channel(8);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        events_tx.send(ClientEvent::ActionsRevealed).expect("send");
        events_tx
            .send(ClientEvent::Navigate("/download_report".into()))
            .expect("send");
        shutdown_tx.send(()).expect("shutdown");

        let failed = run(client, events_rx, dir.path().to_path_buf(), shutdown_rx).await;
        assert_eq!(failed, 1);
        assert!(!dir.path().join("report").exists());
    }
}
