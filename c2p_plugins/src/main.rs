//! # c2p
//!
//! Command-line front end for the compliance-to-policy framework.
//!
//! Exit codes: 0 = success, 1 = error.

use c2p_framework::config::{C2PConfig, LogFormat, LoggingPreferences};
use c2p_framework::logging::{codes, create_logging_service, LogLevel, LoggingService};
use c2p_framework::oscal::{
    assessment_results_to_json, load_assessment_results, load_catalog, load_component_definition,
};
use c2p_framework::plugin::{PluginError, PluginSpec};
use c2p_framework::projection::GENERATOR_VERSION;
use c2p_framework::report::ReportRenderer;
use c2p_framework::{merge_assessment_results, C2PError, C2P};
use c2p_plugins::{create_plugin_registry, load_raw_result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "c2p", about = "Map OSCAL compliance to policy validation points and back")]
struct Cli {
    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version.
    Version,
    /// Convert a PVP's native results into OSCAL assessment results.
    ResultToCompliance {
        /// Path to the c2p configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Plugin name (auditree, kyverno or ocm).
        #[arg(short, long)]
        plugin: String,
        /// Raw tool output files (JSON or YAML).
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        /// Extra properties handed to the plugin, as key=value.
        #[arg(long = "additional-prop", value_parser = parse_key_value)]
        additional_props: Vec<(String, String)>,
        /// Output file for the assessment results (stdout when omitted).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Generate the PVP's policy deliverable from the component definition.
    ComplianceToPolicy {
        /// Path to the c2p configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Plugin name (auditree, kyverno or ocm).
        #[arg(short, long)]
        plugin: String,
    },
    /// Auxiliary tools.
    Tools {
        #[command(subcommand)]
        tool: Tools,
    },
}

#[derive(Subcommand)]
enum Tools {
    /// Render assessment results as a Markdown report.
    Viewer {
        /// Path to the assessment results.
        #[arg(long = "assessment-results")]
        assessment_results: PathBuf,
        /// Path to the component definition.
        #[arg(long = "component-definition")]
        component_definition: PathBuf,
        /// Optional catalog for control titles.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Merge several assessment results into one document.
    Merge {
        /// Title of the merged result.
        #[arg(short, long)]
        title: String,
        /// Assessment results to merge.
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

/// Accept the single-dash long flags `-ar` and `-cdef`
fn normalize_args(args: impl Iterator<Item = String>) -> Vec<String> {
    args.map(|arg| match arg.as_str() {
        "-ar" => "--assessment-results".to_string(),
        "-cdef" => "--component-definition".to_string(),
        _ => arg,
    })
    .collect()
}

fn init_logging(verbose: bool) -> LoggingService {
    let mut preferences = LoggingPreferences::default();
    if verbose {
        preferences = preferences.with_min_level(LogLevel::Debug);
    }

    if preferences.format == LogFormat::Facade {
        let filter = if verbose { "debug" } else { "info" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
            .format_timestamp(None)
            .init();
    }

    create_logging_service(&preferences)
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args()));
    let logger = init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Version => {
            println!("c2p {}", GENERATOR_VERSION);
            Ok(())
        }
        Commands::ResultToCompliance {
            config,
            plugin,
            input,
            additional_props,
            out,
        } => run_result_to_compliance(&config, &plugin, &input, additional_props, out.as_deref(), logger),
        Commands::ComplianceToPolicy { config, plugin } => run_compliance_to_policy(&config, &plugin, logger),
        Commands::Tools { tool } => match tool {
            Tools::Viewer {
                assessment_results,
                component_definition,
                catalog,
                out,
            } => run_viewer(
                &assessment_results,
                &component_definition,
                catalog.as_deref(),
                out.as_deref(),
                &logger,
            )
            .map_err(PluginError::from),
            Tools::Merge { title, input, out } => run_merge(&title, &input, out.as_deref(), &logger).map_err(PluginError::from),
        },
    };

    if let Err(e) = outcome {
        log::error!("[{}] {}", e.error_code(), e);
        eprintln!("Error: {}", e.user_message());
        process::exit(1);
    }
}

fn run_result_to_compliance(
    config_path: &Path,
    plugin_name: &str,
    inputs: &[PathBuf],
    additional_props: Vec<(String, String)>,
    out: Option<&Path>,
    logger: LoggingService,
) -> Result<(), PluginError> {
    let config = C2PConfig::load(config_path)?;
    let registry = create_plugin_registry(&config, logger.clone())?;
    let plugin = registry.get(plugin_name)?;

    let mut raw_result = load_raw_result(inputs)?;
    for (key, value) in additional_props {
        raw_result = raw_result.with_additional_prop(&key, Value::String(value));
    }
    let pvp_result = plugin.generate_pvp_result(&raw_result)?;

    let mut c2p = C2P::new(config, logger)?;
    c2p.set_pvp_result(pvp_result);
    let assessment_results = c2p.result_to_oscal()?;

    emit(&assessment_results_to_json(&assessment_results)?, out)?;
    Ok(())
}

fn run_compliance_to_policy(config_path: &Path, plugin_name: &str, logger: LoggingService) -> Result<(), PluginError> {
    let config = C2PConfig::load(config_path)?;
    let registry = create_plugin_registry(&config, logger.clone())?;
    let plugin = registry.get(plugin_name)?;

    let c2p = C2P::new(config, logger)?;
    plugin.generate_pvp_policy(&c2p.get_policy())
}

fn run_viewer(
    assessment_results: &Path,
    component_definition: &Path,
    catalog: Option<&Path>,
    out: Option<&Path>,
    logger: &LoggingService,
) -> Result<(), C2PError> {
    let assessment_results = load_assessment_results(assessment_results)?;
    let component_definition = load_component_definition(component_definition)?;

    let mut renderer = ReportRenderer::new();
    if let Some(catalog) = catalog {
        renderer = renderer.with_catalog(load_catalog(catalog)?);
    }
    let markdown = renderer.render(&assessment_results, &component_definition);
    logger.log_success(codes::success::REPORT_RENDERED, "Rendered assessment results report");

    emit(&markdown, out)
}

fn run_merge(title: &str, inputs: &[PathBuf], out: Option<&Path>, logger: &LoggingService) -> Result<(), C2PError> {
    let results = inputs
        .iter()
        .map(load_assessment_results)
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_assessment_results(title, &results, logger);
    emit(&assessment_results_to_json(&merged)?, out)
}

fn emit(content: &str, out: Option<&Path>) -> Result<(), C2PError> {
    match out {
        Some(path) => std::fs::write(path, content).map_err(|e| C2PError::io(path, e)),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
