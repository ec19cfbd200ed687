use chrono::Utc;
use reviewbell_core::notifier::EngineState;
use reviewbell_core::storage::data_dir;

use super::{StateFile, STATE_FILE};

/// Print the engine state mirrored by the daemon's last wake-up request,
/// plus how long until (or since) that wake-up is due.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = data_dir()?.join(STATE_FILE);
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    let Ok(mirror) = serde_json::from_str::<StateFile>(&content) else {
        println!("no persisted state (daemon has not run yet)");
        return Ok(());
    };

    let state = EngineState::from_payload(&mirror.payload);
    if state.is_first_boot() {
        println!("no persisted state (daemon has not run yet)");
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&state)?);
    let remaining = (mirror.wake_at - Utc::now()).num_seconds();
    if remaining >= 0 {
        println!("next wake-up at {} (in {remaining}s)", mirror.wake_at);
    } else {
        println!("next wake-up at {} ({}s overdue)", mirror.wake_at, -remaining);
    }
    Ok(())
}
