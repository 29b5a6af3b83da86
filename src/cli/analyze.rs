
use anyhow::bail;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct AnalyzeSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    starling_version: String,

    /// Patient variant call file (VCF)
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub vcf_filename: PathBuf,

    /// Pharmacogenomic knowledge database (JSON)
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "database")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub database_filename: PathBuf,

    /// A drug to assess; repeat the flag for multiple drugs
    #[clap(required = true)]
    #[clap(long = "drug")]
    #[clap(value_name = "DRUG")]
    #[clap(help_heading = Some("Input/Output"))]
    pub drugs: Vec<String>,

    /// Output directory containing the report and summary table
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// The sample name to analyze in the VCF [default: first sample]
    #[clap(long = "sample-name")]
    #[clap(value_name = "SAMPLE")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "", hide_default_value = true)]
    pub sample_name: String,

    /// Maximum input VCF size (MB) accepted before refusing to load
    #[clap(long = "max-filesize")]
    #[clap(value_name = "MB")]
    #[clap(help_heading = Some("Analysis parameters"))]
    #[clap(default_value = "50")]
    pub max_filesize_mb: u64,

    /// Maximum number of decode errors retained in the report
    #[clap(long = "max-reported-errors")]
    #[clap(value_name = "INT")]
    #[clap(help_heading = Some("Analysis parameters"))]
    #[clap(default_value = "50")]
    pub max_reported_errors: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_analyze_settings(mut settings: AnalyzeSettings) -> anyhow::Result<AnalyzeSettings> {
    // hard code the version in
    settings.starling_version = FULL_VERSION.clone();
    info!("Starling version: {:?}", &settings.starling_version);
    info!("Sub-command: analyze");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.vcf_filename, "Patient VCF")?;
    check_required_filename(&settings.database_filename, "Database JSON")?;

    // dump stuff to the logger
    info!("\tPatient VCF: {:?}", &settings.vcf_filename);
    info!("\tDatabase: {:?}", &settings.database_filename);
    if settings.sample_name.is_empty() {
        info!("\tSample: first sample in file");
    } else {
        info!("\tSample: {:?}", &settings.sample_name);
    }

    // every requested drug must have something left after trimming
    if settings.drugs.iter().all(|d| d.trim().is_empty()) {
        bail!("At least one non-empty --drug is required");
    }
    info!("\tDrugs: {:?}", &settings.drugs);

    // outputs
    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.output_folder);

    // other misc parameters
    info!("Analysis parameters:");
    if settings.max_filesize_mb == 0 {
        bail!("--max-filesize must be >0");
    }
    info!("\tMaximum VCF size: {} MB", settings.max_filesize_mb);
    info!("\tMaximum reported decode errors: {}", settings.max_reported_errors);

    Ok(settings)
}
