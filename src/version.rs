//! 版本信息与新版本检查

use crate::error::Result;
use serde::Deserialize;
use std::cmp::Ordering;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = match option_env!("OTGEN_COMMIT") {
    Some(c) => c,
    None => "none",
};
pub const BUILD_DATE: &str = match option_env!("OTGEN_BUILD_DATE") {
    Some(d) => d,
    None => "unknown",
};
pub const REPO_URL: &str = "https://github.com/open-traffic-generator/otgen";

const LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/open-traffic-generator/otgen/releases/latest";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub published_at: Option<String>,
}

pub fn print_version(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "version: {VERSION}")?;
    writeln!(out, " commit: {COMMIT}")?;
    writeln!(out, "   date: {BUILD_DATE}")?;
    writeln!(out, " source: {REPO_URL}")?;
    Ok(())
}

/// Numeric `major.minor.patch` parts; a leading `v` and any `-pre`/`+build` suffix are ignored.
fn numeric_parts(version: &str) -> Option<Vec<u64>> {
    let core = version.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next().unwrap_or(core);
    core.split('.').map(|p| p.parse().ok()).collect()
}

/// True when `latest` is a strictly newer release than `current`.
pub fn is_newer(current: &str, latest: &str) -> bool {
    let (Some(mut cur), Some(mut lat)) = (numeric_parts(current), numeric_parts(latest)) else {
        return false;
    };
    let len = cur.len().max(lat.len());
    cur.resize(len, 0);
    lat.resize(len, 0);
    lat.cmp(&cur) == Ordering::Greater
}

fn fetch_latest() -> Result<Release> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("otgen/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()?;
    debug!(url = LATEST_RELEASE_URL, "checking for updates");
    let release = client
        .get(LATEST_RELEASE_URL)
        .send()?
        .error_for_status()?
        .json()?;
    Ok(release)
}

pub fn print_update_notice(out: &mut dyn Write, release: &Release) -> Result<()> {
    writeln!(out)?;
    let released = release
        .published_at
        .as_deref()
        .and_then(|d| d.split('T').next())
        .unwrap_or("unknown date");
    writeln!(
        out,
        "Update available: version {} is the latest, released on {released}",
        release.tag_name
    )?;
    writeln!(
        out,
        "Release notes:    {REPO_URL}/releases/tag/{}",
        release.tag_name
    )?;
    Ok(())
}

/// 打印版本；`check` 时查询最新发布，查询失败只记录警告。
pub fn run(check: bool, out: &mut dyn Write) -> Result<()> {
    print_version(out)?;
    if !check {
        return Ok(());
    }
    match fetch_latest() {
        Ok(release) if is_newer(VERSION, &release.tag_name) => print_update_notice(out, &release),
        Ok(release) => {
            debug!(latest = %release.tag_name, "otgen is up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Error getting update info: {e}");
            Ok(())
        }
    }
}
