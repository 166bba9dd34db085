//! Rate-limited receipt extraction

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use splitcheck_core::{
    Database, ExtractionBackend, ExtractionClient, ExtractionService, ImageInput,
    ReceiptWithItems,
};
use tracing::{info, warn};

use super::{print_receipt, LayeredPolicyStore, SessionFile};

pub async fn cmd_extract(
    db: &Database,
    policy_path: Option<&Path>,
    client: ExtractionClient,
    image: &Path,
    user: &str,
    language: Option<&str>,
    session_out: Option<&Path>,
) -> Result<()> {
    if !image.exists() {
        return Err(anyhow!("File not found: {}", image.display()));
    }
    let image = ImageInput::from_path(image).context("Failed to read receipt image")?;

    info!(backend = client.name(), "Extracting receipt");
    println!("📷 Reading receipt with {}...", client.name());

    let policy = Arc::new(LayeredPolicyStore::new(db.clone(), policy_path));
    let service = ExtractionService::new(Arc::new(db.clone()), policy, client);

    let outcome = service
        .generate_receipt(user, &image, language)
        .await
        .map_err(|e| {
            warn!(user, "Extraction failed: {}", e);
            anyhow!(e.user_message())
        })?;

    let extracted = ReceiptWithItems {
        receipt: outcome.receipt,
        items: outcome.items,
    };
    print_receipt(&extracted);
    println!("   Attempts left: {}", outcome.attempts_left);

    if let Some(out) = session_out {
        SessionFile::from(extracted).save(out)?;
        println!("✅ Session written to {}", out.display());
    }

    Ok(())
}
