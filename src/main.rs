//! # lncfeat CLI
//!
//! ```bash
//! # classify every transcript of at least 300 nt using 8 workers
//! lncfeat -p transcripts.fa -t 300 -n 8
//!
//! # only write the feature files and sequence log
//! lncfeat -p transcripts.fa --extract-only -o features/
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;

use lncfeat::{Pipeline, PipelineConfig, ToolConfig, WindowConvention, MIN_THRESHOLD};

fn cli() -> Command {
    Command::new("lncfeat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classify transcripts as coding or long-non-coding from sequence composition")
        .arg(
            Arg::new("path")
                .short('p')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Input sequence file for prediction"),
        )
        .arg(
            Arg::new("threshold")
                .short('t')
                .value_name("INT")
                .value_parser(value_parser!(usize))
                .default_value("200")
                .help("Sequence length threshold (at least 200)"),
        )
        .arg(
            Arg::new("threads")
                .short('n')
                .value_name("INT")
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Number of worker threads"),
        )
        .arg(
            Arg::new("outdir")
                .short('o')
                .long("outdir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("Directory for the sequence log, label report, and intermediates"),
        )
        .arg(
            Arg::new("libsvm")
                .long("libsvm")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory containing svm-scale and svm-predict"),
        )
        .arg(
            Arg::new("weka")
                .long("weka")
                .value_name("JAR")
                .value_parser(value_parser!(PathBuf))
                .help("Path to weka.jar"),
        )
        .arg(
            Arg::new("java")
                .long("java")
                .value_name("BIN")
                .value_parser(value_parser!(PathBuf))
                .help("Java runtime used to run Weka"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory with range files, models, and wekatrain.arff"),
        )
        .arg(
            Arg::new("extract-only")
                .long("extract-only")
                .action(ArgAction::SetTrue)
                .help("Stop after writing the feature files"),
        )
        .arg(
            Arg::new("keep")
                .long("keep")
                .action(ArgAction::SetTrue)
                .help("Keep feature, prediction, and relation files"),
        )
        .arg(
            Arg::new("full-windows")
                .long("full-windows")
                .action(ArgAction::SetTrue)
                .help("Count the final k-mer window of each sequence"),
        )
}

fn tool_config(matches: &ArgMatches) -> ToolConfig {
    let mut tools = match matches.get_one::<PathBuf>("libsvm") {
        Some(dir) => ToolConfig::with_libsvm_dir(dir),
        None => ToolConfig::default(),
    };
    if let Some(jar) = matches.get_one::<PathBuf>("weka") {
        tools.weka_jar.clone_from(jar);
    }
    if let Some(java) = matches.get_one::<PathBuf>("java") {
        tools.java.clone_from(java);
    }
    if let Some(data) = matches.get_one::<PathBuf>("data") {
        tools.data_dir.clone_from(data);
    }
    tools
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut command = cli();
    let matches = command.clone().get_matches();

    let Some(path) = matches.get_one::<PathBuf>("path") else {
        println!("invalid input");
        command.print_help()?;
        println!();
        return Ok(());
    };

    let convention = if matches.get_flag("full-windows") {
        WindowConvention::Full
    } else {
        WindowConvention::LookAhead
    };
    let config = PipelineConfig::builder()
        .input(path)
        .threshold(
            matches
                .get_one::<usize>("threshold")
                .copied()
                .unwrap_or(MIN_THRESHOLD),
        )
        .workers(matches.get_one::<usize>("threads").copied().unwrap_or(1))
        .out_dir(
            matches
                .get_one::<PathBuf>("outdir")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(".")),
        )
        .convention(convention)
        .keep_intermediates(matches.get_flag("keep"))
        .extract_only(matches.get_flag("extract-only"))
        .tools(tool_config(&matches))
        .build()?;

    let summary = Pipeline::new(config).run()?;
    info!(
        "Wrote features for {} of {} accepted records",
        summary.extract.written, summary.extract.accepted
    );
    if let Some(report) = summary.report {
        info!("Labels written to {}", report.display());
    }
    Ok(())
}
