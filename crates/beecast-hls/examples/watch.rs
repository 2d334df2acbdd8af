use std::{env, error::Error, sync::Arc, time::Duration};

use beecast_hls::{manifest, ManifestStore, ManifestSync, SyncEvent, SyncOptions};
use beecast_net::{HttpClient, NetOptions};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                // Override via `RUST_LOG=beecast_hls=trace,beecast_net=debug`.
                .add_directive("beecast_hls=debug".parse()?)
                .add_directive("beecast_net=info".parse()?),
        )
        .init();

    let mut args = env::args().skip(1);
    let stream = args.next().unwrap_or_else(|| {
        eprintln!("usage: watch <owner>/<topic> [node-url]");
        std::process::exit(2);
    });
    let node_url: Url = args
        .next()
        .unwrap_or_else(|| "http://localhost:1633/".to_string())
        .parse()?;

    let store = Arc::new(ManifestStore::new());
    let options = SyncOptions::new(node_url).with_net(NetOptions::default());
    let net = HttpClient::new(options.net.clone());
    let sync = ManifestSync::new(net, options, Arc::clone(&store));

    let mut events = sync.events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SyncEvent::SnapshotApplied {
                    topic,
                    segments_added,
                } => eprintln!("[events] {topic}: +{segments_added} segment(s)"),
                SyncEvent::StreamFinalized { topic } => eprintln!("[events] {topic}: finalized"),
                SyncEvent::FollowUpFailed { topic, error } => {
                    eprintln!("[events] {topic}: poll failed: {error}");
                }
            }
        }
    });

    // Poll the way a player's playlist loader would: one fetch per interval,
    // each answer being the best-currently-known playlist.
    loop {
        let playlist = sync.fetch(&stream).await?;
        let segments = manifest::segment_entries(&playlist).len();
        eprintln!("[watch] {segments} segment(s) accumulated");

        if manifest::is_final(&playlist) {
            println!("{playlist}");
            break;
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    sync.shutdown().await;
    Ok(())
}
