use reviewbell_core::client::{ReviewSource, SummaryClient};
use reviewbell_core::notifier::NotifierEngine;
use reviewbell_core::storage::Config;

/// One-shot poll: fetch the summary and print how it would classify.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let client = SummaryClient::new(&config.service.endpoint, &config.service.api_token)?;

    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(client.fetch_summary());

    match snapshot.error {
        Some(kind) => println!("fetch failed: {kind:?}"),
        None => {
            println!(
                "reviews: {}  lessons: {}",
                snapshot.reviews_available, snapshot.lessons_available
            );
            if let Some(at) = snapshot.next_review_at {
                println!("next review at: {at}");
            }
            let state = NotifierEngine::classify(&snapshot, config.notifier.threshold);
            println!("classified as: {state:?} (threshold {})", config.notifier.threshold);
        }
    }
    Ok(())
}
