//! First-boot seeding of demo billers so BPAY payments have something to
//! resolve against in a fresh environment.

use tracing::info;

use crate::error::Result;
use crate::models::NewBiller;
use crate::store::Store;

pub async fn seed_demo_data(store: &dyn Store) -> Result<()> {
    if !store.billers().await?.is_empty() {
        info!("store already has billers, skipping seed");
        return Ok(());
    }

    info!("seeding demo billers...");

    let billers = [
        ("City Power & Gas", "2775", "utilities"),
        ("AquaNet Water", "51003", "utilities"),
        ("MetroNet Internet", "93557", "telecom"),
        ("Southbank Council Rates", "17402", "government"),
    ];

    for (name, code, category) in billers {
        store
            .insert_biller(NewBiller {
                name: name.to_string(),
                code: code.to_string(),
                category: Some(category.to_string()),
            })
            .await?;
    }

    info!("demo billers seeded");
    Ok(())
}
