use crate::cli::ScoreArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use afidesign::{engine::progress::ProgressReporter, io, workflows};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: ScoreArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    let run_config = partial_config.into_score_config(&args)?;

    let mut inputs = args.sequences.clone();
    if let Some(path) = &args.input {
        inputs.extend(read_sequences(path)?);
    }
    if inputs.is_empty() {
        return Err(CliError::Argument(
            "No sequences given; pass them as arguments or with --input.".to_string(),
        ));
    }

    let predictor = run_config.predictor.load()?;
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Scoring {} sequence(s)...", inputs.len());
    let report = workflows::score::run(
        &inputs,
        &run_config.weights,
        predictor.as_ref(),
        &reporter,
        run_config.max_workers,
    )?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            io::write_scored_table(&report.scored, None, BufWriter::new(file))?;
            println!(
                "✓ {} score(s) written to: {}",
                report.scored.len(),
                path.display()
            );
        }
        None => io::write_scored_table(&report.scored, None, std::io::stdout().lock())?,
    }

    for skipped in &report.skipped {
        warn!("{} skipped ({}): {}", skipped.label, skipped.error.kind(), skipped.error);
        eprintln!("  {} '{}' skipped: {}", skipped.label, skipped.input, skipped.error);
    }

    Ok(())
}

/// One sequence per line; blank lines and `#` comments are ignored.
fn read_sequences(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    Ok(parse_sequence_lines(&content))
}

fn parse_sequence_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_lines_skip_comments_and_blanks() {
        let content = "# candidates\nKRWKRW\n\n  yCRTYW  # lower case is fine\n#\nRRR\n";
        assert_eq!(
            parse_sequence_lines(content),
            vec!["KRWKRW", "yCRTYW", "RRR"]
        );
    }

    #[test]
    fn missing_input_file_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_sequences(&dir.path().join("absent.txt"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
