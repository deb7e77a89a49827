mod flow_builder;
mod otg_model;
mod run_targets;
mod version;

use crate::otg::MetricsResponse;

/// Environment lookup backed by a fixed table, so tests never touch process env.
pub(crate) fn fake_env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

pub(crate) fn no_env(_: &str) -> Option<String> {
    None
}

pub(crate) fn metrics(raw: &str) -> MetricsResponse {
    serde_json::from_str(raw).expect("parse metrics response")
}
