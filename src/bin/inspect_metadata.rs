//! Inspect the persisted group metadata snapshot.
//!
//! Usage:
//!   mypeople-meta           print the snapshot as pretty JSON
//!   mypeople-meta --path    print where the snapshot lives
//!   mypeople-meta --reset   delete the snapshot (colors and order fall back)

use mypeople_lib::config::load_config;
use mypeople_lib::metadata::{GroupMetadataStore, MetadataSnapshot};

fn main() -> anyhow::Result<()> {
    mypeople_lib::logging::init();

    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;
    let store = GroupMetadataStore::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to locate metadata: {e}"))?;

    match std::env::args().nth(1).as_deref() {
        Some("--path") => println!("{}", store.path().display()),
        Some("--reset") => {
            store.clear()?;
            log::info!("Removed {}", store.path().display());
        }
        Some(other) => anyhow::bail!("Unknown argument: {other}"),
        None => {
            let snapshot = match store.load() {
                Ok(snapshot) => snapshot,
                Err(e) if e.is_missing() => {
                    log::info!("No metadata at {} yet", store.path().display());
                    MetadataSnapshot::default()
                }
                Err(e) => return Err(e.into()),
            };
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
