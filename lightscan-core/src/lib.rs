pub mod aggregate;
pub mod discovery;
pub mod finding;
pub mod fingerprint;
pub mod probe;
pub mod report;
pub mod scan;
pub mod security;
pub mod sqli;
pub mod xss;

pub use aggregate::{FindingStreams, aggregate};
pub use finding::{Category, Finding, Severity};
pub use report::{ReportData, ReportFormat, write_reports};
pub use scan::{ScanConfig, ScanProgressCallback, ScanState, execute_scan};

pub const BANNER: &str = r"
  _     _       _     _   ____
 | |   (_) __ _| |__ | |_/ ___|  ___ __ _ _ __
 | |   | |/ _` | '_ \| __\___ \ / __/ _` | '_ \
 | |___| | (_| | | | | |_ ___) | (_| (_| | | | |
 |_____|_|\__, |_| |_|\__|____/ \___\__,_|_| |_|
          |___/
";

pub fn print_banner() {
    println!("{}", BANNER);
    println!(
        "  LightScan v{} - lightweight, non-intrusive web scanner\n",
        env!("CARGO_PKG_VERSION")
    );
}
