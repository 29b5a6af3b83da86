
use log::{LevelFilter, error, info, warn};
use std::time::Instant;

use starling::analysis::{analyze, AnalysisConfigBuilder};
use starling::cli::analyze::{AnalyzeSettings, check_analyze_settings};
use starling::cli::core::{Commands, get_cli};
use starling::database::pgx_database::PgxDatabase;
use starling::util::json_io::save_json;
use starling::writers::summary::RiskSummaryWriter;

fn run_analyze(settings: AnalyzeSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_analyze_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // load the knowledge database
    info!("Pre-loading database into memory...");
    let database = match PgxDatabase::from_json(&settings.database_filename) {
        Ok(db) => db,
        Err(e) => {
            error!("Error while loading database: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    info!("Database version: {:?}, genes: {}", database.version(), database.genes().len());

    // refuse oversized inputs before reading them; decompressed sizes can still
    // exceed this for gzipped files, which is accepted
    let max_bytes = settings.max_filesize_mb * 1024 * 1024;
    match std::fs::metadata(&settings.vcf_filename) {
        Ok(meta) if meta.len() > max_bytes => {
            error!(
                "Patient VCF is {} bytes, which exceeds the {} MB limit; use --max-filesize to raise it",
                meta.len(), settings.max_filesize_mb
            );
            std::process::exit(exitcode::DATAERR);
        },
        Ok(_) => {},
        Err(e) => {
            error!("Error while inspecting patient VCF: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    info!("Loading patient VCF...");
    let file_content = match std::fs::read(&settings.vcf_filename) {
        Ok(fc) => fc,
        Err(e) => {
            error!("Error while reading patient VCF: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };

    // run the full pipeline
    let sample_name = if settings.sample_name.is_empty() { None } else { Some(settings.sample_name.clone()) };
    let config = match AnalysisConfigBuilder::default()
        .sample_name(sample_name)
        .max_reported_errors(settings.max_reported_errors)
        .build() {
        Ok(c) => c,
        Err(e) => {
            error!("Error while building analysis config: {e}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    info!("Analyzing patient variants...");
    let results = match analyze(&file_content, &settings.drugs, &database, &config) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while analyzing patient VCF: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    let summary = results.summary();
    info!(
        "Decoded {} records, {} matched a pharmacogene, {} lines skipped.",
        summary.total_records(), summary.matched_records(), summary.skipped_lines()
    );
    for prediction in results.phenotypes().iter() {
        info!(
            "\t{}: {} => {}", prediction.gene(), prediction.diplotype(), prediction.phenotype_name()
        );
    }
    let overall = results.overall_risk();
    if overall.flags().is_empty() {
        info!("Overall risk level: {}", overall.level());
    } else {
        warn!("Overall risk level: {}, flagged drugs: {:?}", overall.level(), overall.flags());
    }

    // save the full report
    let report_fn = settings.output_folder.join("report.json");
    info!("Saving report to {report_fn:?}...");
    if let Err(e) = save_json(&results, &report_fn) {
        error!("Error while saving report: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    // save the flat per-drug summary
    let summary_fn = settings.output_folder.join("summary.tsv");
    info!("Saving risk summary to {summary_fn:?}...");
    let summary_writer = RiskSummaryWriter::new(&results);
    if let Err(e) = summary_writer.write_summary(&summary_fn) {
        error!("Error while saving risk summary: {e}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Total runtime: {:.2?}", start_time.elapsed());
    info!("Analysis finished successfully, goodbye!");
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Analyze(settings) => run_analyze(*settings)
    }
}
