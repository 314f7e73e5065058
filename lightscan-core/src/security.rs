// Passive security checks over fetched pages: response headers, cookie
// flags and discovered forms

use crate::finding::{Category, Finding, Severity};
use lightscan_scanner::{Cookie, FormDescriptor, Headers};

/// Name substrings (lowercase) that mark a cookie as session-like.
pub const SESSION_COOKIE_MARKERS: &[&str] = &["sess", "auth", "token"];

struct HeaderRule {
    header: &'static str,
    severity: Severity,
    https_only: bool,
    description: &'static str,
    recommendation: &'static str,
}

const HEADER_RULES: &[HeaderRule] = &[
    HeaderRule {
        header: "Content-Security-Policy",
        severity: Severity::Medium,
        https_only: false,
        description: "CSP header not found; this increases risk of XSS.",
        recommendation: "Define a restrictive CSP to mitigate script injection.",
    },
    HeaderRule {
        header: "Strict-Transport-Security",
        severity: Severity::Medium,
        https_only: true,
        description: "HSTS header not set; browsers may allow protocol downgrades.",
        recommendation: "Add HSTS with a suitable max-age and includeSubDomains.",
    },
    HeaderRule {
        header: "X-Frame-Options",
        severity: Severity::Low,
        https_only: false,
        description: "Clickjacking protection header not present.",
        recommendation: "Add X-Frame-Options: DENY or use CSP frame-ancestors.",
    },
    HeaderRule {
        header: "X-Content-Type-Options",
        severity: Severity::Low,
        https_only: false,
        description: "MIME sniffing not disabled; potential content-type confusion.",
        recommendation: "Add X-Content-Type-Options: nosniff.",
    },
    HeaderRule {
        header: "Referrer-Policy",
        severity: Severity::Low,
        https_only: false,
        description: "Referrer-Policy not set; may leak URL info in Referer header.",
        recommendation: "Add a strict Referrer-Policy (e.g., no-referrer or same-origin).",
    },
    HeaderRule {
        header: "Permissions-Policy",
        severity: Severity::Info,
        https_only: false,
        description: "No Permissions-Policy; modern feature usage not limited.",
        recommendation: "Add Permissions-Policy limiting powerful features.",
    },
];

/// One finding per missing security header, located at `target`.
/// HSTS is only expected on https targets.
pub fn check_security_headers(headers: &Headers, target: &str) -> Vec<Finding> {
    let https = target.to_ascii_lowercase().starts_with("https://");

    HEADER_RULES
        .iter()
        .filter(|rule| https || !rule.https_only)
        .filter(|rule| !headers.contains(rule.header))
        .map(|rule| {
            Finding::new(
                format!("Missing {}", rule.header),
                Category::Headers,
                rule.severity,
                target,
            )
            .description(rule.description)
            .evidence(format!("No {} header", rule.header))
            .recommendation(rule.recommendation)
        })
        .collect()
}

pub fn is_session_cookie(name: &str) -> bool {
    let lower = name.to_lowercase();
    SESSION_COOKIE_MARKERS.iter().any(|m| lower.contains(m))
}

/// One finding per cookie missing Secure or HttpOnly.
pub fn check_cookies(cookies: &[Cookie], url: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    for cookie in cookies {
        let session = is_session_cookie(&cookie.name);
        let suffix = if session { " on likely session cookie" } else { "" };

        let mut issues = Vec::new();
        if !cookie.secure {
            issues.push(format!("Missing Secure flag{}", suffix));
        }
        if !cookie.http_only {
            issues.push(format!("Missing HttpOnly flag{}", suffix));
        }
        if issues.is_empty() {
            continue;
        }

        let severity = if session { Severity::Medium } else { Severity::Info };
        findings.push(
            Finding::new(
                format!("Insecure Cookie: {}", cookie.name),
                Category::Cookie,
                severity,
                url,
            )
            .description(format!("Cookie flags incomplete: {}", issues.join("; ")))
            .evidence(format!("Cookie={}", cookie.name))
            .recommendation("Set Secure and HttpOnly (and SameSite) on sensitive cookies."),
        );
    }

    findings
}

/// An Info finding for every discovered form.
pub fn form_findings(forms: &[FormDescriptor]) -> Vec<Finding> {
    forms
        .iter()
        .map(|form| {
            let names: Vec<&str> = form.named_inputs().filter_map(|i| i.probe_name()).collect();
            Finding::new("Form Discovered", Category::Forms, Severity::Info, &form.page_url)
                .description(format!(
                    "Form found with method={} action={}",
                    form.method.as_str().to_uppercase(),
                    form.action
                ))
                .evidence(format!("Inputs: [{}]", names.join(", ")))
                .recommendation("Ensure proper server-side validation and sanitization.")
        })
        .collect()
}
