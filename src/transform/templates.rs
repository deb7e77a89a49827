//! 内置模板与模板辅助函数

use super::Counter;
use crate::error::Result;
use minijinja::{AutoEscape, Environment, Error, ErrorKind};

pub(super) const PORT_FRAMES: &str = concat!(
    r#"[{% for p in port_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ p.name }}", "frames_tx": "{{ p.frames_tx }}", "frames_rx": "{{ p.frames_rx }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const PORT_BYTES: &str = concat!(
    r#"[{% for p in port_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ p.name }}", "bytes_tx": "{{ p.bytes_tx }}", "bytes_rx": "{{ p.bytes_rx }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const PORT_FRAME_RATE: &str = concat!(
    r#"[{% for p in port_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ p.name }}", "frames_tx_rate": "{{ p.frames_tx_rate | fixed(0) }}", "frames_rx_rate": "{{ p.frames_rx_rate | fixed(0) }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const PORT_BYTE_RATE: &str = concat!(
    r#"[{% for p in port_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ p.name }}", "bytes_tx_rate": "{{ p.bytes_tx_rate | fixed(0) }}", "bytes_rx_rate": "{{ p.bytes_rx_rate | fixed(0) }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const PORT_BIT_RATE: &str = concat!(
    r#"[{% for p in port_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ p.name }}", "{{ rate_metric("tx") }}": "{{ p.bytes_tx_rate | byte_rate_to_bits | fixed(4) }}", "{{ rate_metric("rx") }}": "{{ p.bytes_rx_rate | byte_rate_to_bits | fixed(4) }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const FLOW_FRAMES: &str = concat!(
    r#"[{% for f in flow_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ f.name }}", "frames_tx": "{{ f.frames_tx }}", "frames_rx": "{{ f.frames_rx }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const FLOW_BYTES: &str = concat!(
    r#"[{% for f in flow_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ f.name }}", "bytes_tx": "{{ f.bytes_tx }}", "bytes_rx": "{{ f.bytes_rx }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const FLOW_FRAME_RATE: &str = concat!(
    r#"[{% for f in flow_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ f.name }}", "frames_tx_rate": "{{ f.frames_tx_rate | fixed(0) }}", "frames_rx_rate": "{{ f.frames_rx_rate | fixed(0) }}"}{% endfor %}]"#,
    "\n"
);
pub(super) const FLOW_BYTE_RATE: &str = concat!(
    r#"[{% for f in flow_metrics %}{% if not loop.first %},{% endif %}{"name": "{{ f.name }}", "bytes_tx_rate": "{{ frame_rate_to_byte_rate(f.frames_tx, f.bytes_tx, f.frames_tx_rate) | fixed(0) }}", "bytes_rx_rate": "{{ frame_rate_to_byte_rate(f.frames_rx, f.bytes_rx, f.frames_rx_rate) | fixed(0) }}"}{% endfor %}]"#,
    "\n"
);

pub(super) const TEMPLATE_NAME: &str = "metrics";

/// Byte rate to a bit rate in `unit` (`bps`, `Kbps`, `Mbps`, `Gbps`, `Tbps`).
pub fn convert_byte_rate_to_bps(unit: &str, rate: f64) -> Option<f64> {
    let bits = rate * 8.0;
    let value = match unit {
        "bps" => bits,
        "Kbps" => bits / 1e3,
        "Mbps" => bits / 1e6,
        "Gbps" => bits / 1e9,
        "Tbps" => bits / 1e12,
        _ => return None,
    };
    Some(value)
}

/// Average frame size (integer division) times the frame rate.
pub fn frame_rate_to_byte_rate(frames: u64, bytes: u64, rate: f64) -> f64 {
    if frames == 0 || bytes == 0 || rate == 0.0 {
        return 0.0;
    }
    (bytes / frames) as f64 * rate
}

/// `<counter>_tx` or `<counter>_rx`.
pub fn rate_metric_name(counter: &str, direction: &str) -> Option<String> {
    match direction {
        "tx" => Some(format!("{counter}_tx")),
        "rx" => Some(format!("{counter}_rx")),
        _ => None,
    }
}

fn invalid(msg: String) -> Error {
    Error::new(ErrorKind::InvalidOperation, msg)
}

/// 构建模板环境：注册辅助过滤器/函数并加载模板。
pub(super) fn environment<'s>(source: &'s str, counter: Counter) -> Result<Environment<'s>> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);

    env.add_filter("fixed", |value: f64, precision: usize| {
        format!("{value:.precision$}")
    });
    env.add_filter("rate_to_bps", |value: f64, unit: String| {
        convert_byte_rate_to_bps(&unit, value)
            .ok_or_else(|| invalid(format!("Unsupported unit for rate_to_bps: {unit}")))
    });
    let unit = counter.as_str();
    env.add_filter("byte_rate_to_bits", move |value: f64| {
        convert_byte_rate_to_bps(unit, value)
            .ok_or_else(|| invalid(format!("Unsupported unit for byte_rate_to_bits: {unit}")))
    });
    env.add_function("frame_rate_to_byte_rate", frame_rate_to_byte_rate);
    env.add_function("rate_metric", move |direction: String| {
        rate_metric_name(unit, &direction)
            .ok_or_else(|| invalid(format!("Unsupported direction for rate_metric: {direction}")))
    });
    env.add_function("metrics_json", |value: minijinja::Value| {
        serde_json::to_string(&value).map_err(|e| invalid(e.to_string()))
    });

    env.add_template(TEMPLATE_NAME, source)?;
    Ok(env)
}
