//! The notifier daemon.
//!
//! Stands in for the original platform receivers: the alarm plays the OS
//! wake-up machinery, stdin plays the broadcast sources (`tap`, `net`,
//! `wake`), and notifications render to the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reviewbell_core::alarm::Alarm;
use reviewbell_core::client::SummaryClient;
use reviewbell_core::host::HostAdapter;
use reviewbell_core::service::NotifierService;
use reviewbell_core::storage::{data_dir, Config};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{StateFile, STATE_FILE};

/// Terminal-backed host adapter. Wake-ups go through the single-slot alarm
/// and come back to the daemon loop over a channel; the deadline and the
/// payload are mirrored to disk so they survive the process and feed
/// `reviewbell status`.
struct TerminalHost {
    alarm: Alarm,
    wake_tx: mpsc::UnboundedSender<String>,
    state_path: PathBuf,
}

impl HostAdapter for TerminalHost {
    fn show_notification(&self, review_count: u32) -> Result<(), Box<dyn std::error::Error>> {
        println!("[notification] {review_count} reviews waiting");
        Ok(())
    }

    fn hide_notification(&self) -> Result<(), Box<dyn std::error::Error>> {
        println!("[notification] cleared");
        Ok(())
    }

    fn schedule_wakeup(
        &self,
        at: DateTime<Utc>,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mirror = StateFile {
            wake_at: at,
            payload: payload.to_string(),
        };
        std::fs::write(&self.state_path, serde_json::to_string(&mirror)?)?;
        let tx = self.wake_tx.clone();
        let payload = payload.to_string();
        self.alarm.schedule(at - Utc::now(), move || {
            let _ = tx.send(payload.clone());
        });
        Ok(())
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(daemon())
}

async fn daemon() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    if !config.notifier.enabled {
        return Err("notifications are disabled (reviewbell config set notifier.enabled true)".into());
    }

    let client = SummaryClient::new(&config.service.endpoint, &config.service.api_token)?;
    let alarm = Alarm::new();
    let (wake_tx, mut wake_rx) = mpsc::unbounded_channel();
    let host = Arc::new(TerminalHost {
        alarm: alarm.clone(),
        wake_tx,
        state_path: data_dir()?.join(STATE_FILE),
    });
    let service = NotifierService::new(
        config.tuning.clone(),
        config.notifier.threshold,
        client,
        host,
    );

    service.on_boot().await?;
    println!("reviewbell running -- commands: tap, net, wake, quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(payload) = wake_rx.recv() => {
                if let Err(e) = service.on_scheduled_wakeup(&payload).await {
                    eprintln!("wakeup evaluation failed: {e}");
                }
            }
            line = stdin.next_line() => {
                match line?.as_deref().map(str::trim) {
                    Some("tap") => {
                        if let Err(e) = service.on_user_tap().await {
                            eprintln!("tap evaluation failed: {e}");
                        }
                    }
                    Some("net") => {
                        if let Err(e) = service.on_connectivity_change().await {
                            eprintln!("connectivity evaluation failed: {e}");
                        }
                    }
                    // The host may have slept through the countdown;
                    // re-synchronize the alarm against the wall clock.
                    Some("wake") => alarm.on_wake(),
                    Some("quit") | None => break,
                    Some("") => {}
                    Some(other) => eprintln!("unknown command: {other}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    alarm.cancel();
    Ok(())
}
