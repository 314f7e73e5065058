use crate::finding::Finding;
use std::cmp::Reverse;

/// Per-analyzer finding lists, concatenated in field order.
#[derive(Debug, Clone, Default)]
pub struct FindingStreams {
    pub headers: Vec<Finding>,
    pub cookies: Vec<Finding>,
    pub forms: Vec<Finding>,
    pub xss: Vec<Finding>,
    pub sqli: Vec<Finding>,
    pub discovery: Vec<Finding>,
}

/// Concatenate the streams in pipeline order, then order by severity, most
/// severe first. The sort is stable: equal severities keep insertion order.
pub fn aggregate(streams: FindingStreams) -> Vec<Finding> {
    let FindingStreams {
        headers,
        cookies,
        forms,
        xss,
        sqli,
        discovery,
    } = streams;

    let mut findings: Vec<Finding> = [headers, cookies, forms, xss, sqli, discovery]
        .into_iter()
        .flatten()
        .collect();
    sort_by_severity(&mut findings);
    findings
}

pub fn sort_by_severity(findings: &mut [Finding]) {
    findings.sort_by_key(|f| Reverse(f.severity.rank()));
}
