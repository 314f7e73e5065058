use crate::CLAP_STYLING;
use clap::arg;
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("lightscan")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("lightscan")
        .about("Lightweight non-intrusive web vulnerability scanner (authorized testing only)")
        .styles(CLAP_STYLING)
        .arg(
            arg!(<TARGET>)
                .required(true)
                .help("Base target URL, e.g. https://example.com"),
        )
        .arg(
            arg!(--"max-pages" <NUM>)
                .required(false)
                .help("Maximum pages to crawl")
                .value_parser(clap::value_parser!(usize))
                .default_value("100"),
        )
        .arg(
            arg!(--"depth" <NUM>)
                .required(false)
                .help("Maximum crawl depth")
                .value_parser(clap::value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("HTTP timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(--"user-agent" <UA>)
                .required(false)
                .help("Custom User-Agent")
                .default_value("LightScan/1.0"),
        )
        .arg(
            arg!(--"output-dir" <PATH>)
                .required(false)
                .help("Directory to write reports")
                .default_value("reports"),
        )
        .arg(
            arg!(--"format" <FORMATS>)
                .required(false)
                .help("Comma-separated output formats: md,html,txt,json")
                .default_value("md,html,txt"),
        )
        .arg(
            arg!(--"ignore-robots")
                .required(false)
                .help("Ignore robots.txt directives")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"delay" <SECONDS>)
                .required(false)
                .help("Delay in seconds before every request")
                .value_parser(clap::value_parser!(f64))
                .default_value("0"),
        )
        .arg(
            arg!(-t --"threads" <NUM_WORKERS>)
                .required(false)
                .help("The number of async workers used for crawling and probing")
                .value_parser(clap::value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            arg!(--"max-duration" <SECONDS>)
                .required(false)
                .help("Stop the scan after this many seconds and report what was found")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--"hidden-wordlist" <PATH>)
                .required(false)
                .help("Newline-delimited list of hidden paths to probe (default: built-in list)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--"exposed-wordlist" <PATH>)
                .required(false)
                .help("Newline-delimited list of sensitive filenames to probe (default: built-in list)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help("Enable verbose debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"json")
                .required(false)
                .help("Also export JSON output")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-q --"quiet")
                .required(false)
                .help("Suppress banner and non-essential output")
                .action(clap::ArgAction::SetTrue),
        )
}
