//! Parser for the comment header at the top of a package's root `index.d.ts`.
//!
//! ```text
//! // Type definitions for boring 1.2
//! // Project: https://boring.com, https://github.com/boring/boring
//! // Definitions by: Some Author <https://github.com/someauthor>
//! //                 Another Author <https://example.com/another>
//! // Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped
//! // TypeScript Version: 3.1
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::packages::TypeScriptVersion;

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Type definitions for (?:non-npm package )?(?P<name>.+?) (?P<major>\d+)\.(?P<minor>\d+|x)(?:\.\d+)?$")
        .unwrap()
});
static CONTRIBUTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>[^<>,]+?)\s*<(?P<url>[^<>\s]+)>$").unwrap());
static GITHUB_USER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://github\.com/(?P<user>[A-Za-z0-9-]+)/?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub library_name: String,
    pub library_major_version: u32,
    pub library_minor_version: u32,
    pub typescript_version: TypeScriptVersion,
    pub projects: Vec<String>,
    pub contributors: Vec<Contributor>,
}

/// Parse the header, returning a message describing the first problem.
pub fn parse_header(text: &str) -> Result<Header, String> {
    let lines = header_lines(text);
    let mut lines = lines.iter().map(String::as_str).peekable();

    let title = lines.next().ok_or_else(|| "missing header".to_string())?;
    let caps = TITLE_RE
        .captures(title)
        .ok_or_else(|| format!("expected 'Type definitions for <name> <major>.<minor>', got '{title}'"))?;
    let library_name = caps["name"].to_string();
    let library_major_version = parse_number(&caps["major"])?;
    let library_minor_version = match &caps["minor"] {
        "x" => 0,
        minor => parse_number(minor)?,
    };

    let projects_line = expect_field(lines.next(), "Project")?;
    let projects: Vec<String> = projects_line
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if projects.is_empty() {
        return Err("'Project' must list at least one URL".to_string());
    }

    let mut contributor_text = expect_field(lines.next(), "Definitions by")?.to_string();
    // Continuation lines are indented to line up under the first contributor.
    while let Some(next) = lines.peek() {
        if next.starts_with(' ') || next.starts_with('\t') {
            contributor_text.push(',');
            contributor_text.push_str(next.trim());
            lines.next();
        } else {
            break;
        }
    }
    let contributors = parse_contributors(&contributor_text)?;

    expect_field(lines.next(), "Definitions")?;

    let typescript_version = match lines.next() {
        Some(line) => {
            let value = expect_field(Some(line), "TypeScript Version")?;
            value
                .parse::<TypeScriptVersion>()
                .map_err(|_| format!("unsupported TypeScript version '{value}'"))?
        }
        None => TypeScriptVersion::default(),
    };

    Ok(Header {
        library_name,
        library_major_version,
        library_minor_version,
        typescript_version,
        projects,
        contributors,
    })
}

/// Leading `//` comment lines with the marker stripped. Reference
/// directives end the header.
fn header_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut out = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.starts_with("///") {
            break;
        }
        let Some(body) = trimmed.strip_prefix("//") else {
            break;
        };
        let body = body.strip_prefix(' ').unwrap_or(body);
        if body.trim().is_empty() {
            break;
        }
        out.push(body.to_string());
    }
    out
}

fn expect_field<'a>(line: Option<&'a str>, field: &str) -> Result<&'a str, String> {
    let line = line.ok_or_else(|| format!("missing '{field}:' line"))?;
    line.strip_prefix(field)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(str::trim)
        .ok_or_else(|| format!("expected '{field}:', got '{line}'"))
}

fn parse_number(digits: &str) -> Result<u32, String> {
    digits
        .parse()
        .map_err(|_| format!("'{digits}' is not a valid version number"))
}

fn parse_contributors(text: &str) -> Result<Vec<Contributor>, String> {
    let mut out = Vec::new();
    for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let caps = CONTRIBUTOR_RE
            .captures(entry)
            .ok_or_else(|| format!("expected contributor as 'Name <url>', got '{entry}'"))?;
        let url = caps["url"].to_string();
        let github_username = GITHUB_USER_RE
            .captures(&url)
            .map(|c| c["user"].to_string());
        out.push(Contributor {
            name: caps["name"].to_string(),
            url,
            github_username,
        });
    }
    if out.is_empty() {
        return Err("'Definitions by' must list at least one contributor".to_string());
    }
    Ok(out)
}

#[cfg(test)]
#[path = "tests/header_tests.rs"]
mod tests;
