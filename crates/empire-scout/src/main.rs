mod bootstrap;
mod report;

use anyhow::Result;
use scout_core::settings::Settings;
use scout_data::reader::{apply_link, resolve_sources};
use scout_data::workbook::Workbook;
use scout_runtime::orchestrator::IngestOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Empire Scout v{} starting", env!("CARGO_PKG_VERSION"));

    let workbook_path = settings.workbook_path();
    tracing::info!(
        "Workbook: {}, View: {}",
        workbook_path.display(),
        settings.view
    );

    let workbook = if settings.sources.is_empty() {
        Workbook::load(&workbook_path)?
    } else {
        let sources = resolve_sources(&settings.sources)?;
        let sources = apply_link(sources, settings.link.as_deref())?;
        tracing::info!("Ingesting {} replay(s)...", sources.len());

        let (workbook, ingest) = IngestOrchestrator::new(&workbook_path)
            .run(sources)
            .await?;

        print!("{}", report::render_ingest(&ingest));
        if ingest.recorded() == 0 {
            anyhow::bail!("no replay could be recorded");
        }
        workbook
    };

    match settings.view.as_str() {
        "usage" => print!("{}", report::render_usage(&workbook.usage, settings.top)),
        "matches" => print!("{}", report::render_matches(&workbook.matches)),
        "teams" => print!("{}", report::render_teams(&workbook.teams)),
        "none" => {}
        unknown => eprintln!("Unknown view: {}", unknown),
    }

    Ok(())
}
