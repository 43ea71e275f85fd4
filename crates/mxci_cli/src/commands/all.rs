//! All command - Build and test every platform.

use anyhow::Result;

use super::{dispatcher, runner, Cli};

pub async fn execute(cli: &Cli) -> Result<()> {
    let runner = runner(cli)?;
    let dispatcher = dispatcher(cli, &runner);

    let reports = dispatcher.run_all().await?;

    if reports.is_empty() {
        println!("⚠️  No platforms found in {}", dispatcher.catalog().dir().display());
        return Ok(());
    }

    println!();
    for report in &reports {
        match &report.artifacts {
            Some(dir) => println!("✅ {} → {}", report.platform, dir.display()),
            None => println!("✅ {}", report.platform),
        }
    }
    println!("Results: {} platform(s) completed", reports.len());

    Ok(())
}
