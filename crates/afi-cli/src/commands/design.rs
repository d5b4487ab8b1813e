use crate::cli::DesignArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use afidesign::{
    core::models::sequence::Sequence, engine::progress::ProgressReporter, io, workflows,
};
use tracing::info;

pub fn run(args: DesignArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let run_config = partial_config.into_design_config(&args)?;

    let initial = Sequence::parse(&args.sequence)
        .map_err(|e| CliError::Argument(format!("Invalid initial sequence: {}", e)))?;
    let predictor = run_config.predictor.load()?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting design of a {}-residue peptide...", initial.len());
    info!("Invoking the core design workflow...");

    let report = workflows::design::run(
        &initial,
        &run_config.design,
        predictor.as_ref(),
        &reporter,
    )?;

    let written =
        io::write_design_report(&report, &run_config.design.global_search, &args.output)?;
    info!("Wrote {} report file(s) to {:?}", written.len(), &args.output);

    let reference = report.initial.afi;
    println!("Design complete (weights {}).", report.weights_version);
    for variant in report.variants() {
        println!(
            "  {:<10} {:>9.4}  {:>7.2}%  {}",
            variant.name,
            variant.afi.value(),
            variant.afi.relative_decrease(reference),
            variant.sequence
        );
    }
    let skipped = report.diagnostics.total_skipped();
    if skipped > 0 {
        println!("  {} candidate(s) skipped; see skipped.csv.", skipped);
    }
    println!("✓ Reports written to: {}", args.output.display());

    Ok(())
}
