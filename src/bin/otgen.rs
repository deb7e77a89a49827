use clap::{Args, Parser, Subcommand};
use otgen::build::defaults::{self, Env};
use otgen::build::{
    BgpOptions, DeviceOptions, FlowOptions, IpVersion, LatencyMetrics, Proto, RouteSpec,
    apply_bgp, apply_device, apply_flow, parse_as_type, parse_route,
};
use otgen::display::{self, ChartType, DisplayMode, DisplayOptions};
use otgen::error::Result;
use otgen::otg::{BgpAsType, Config, DocFormat, parse_config, read_source, to_yaml};
use otgen::run::{self, MetricSelection, ProtocolsMode, RunSettings, RxBgp, parse_duration};
use otgen::transform::{Counter, TemplateSource, TransformMetric, TransformOptions, Transformer};
use otgen::version;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// Open Traffic Generator CLI Tool
#[derive(Debug, Parser)]
#[command(name = "otgen", about = "Open Traffic Generator CLI Tool")]
struct Cli {
    /// Logging level: err | warn | info | debug
    #[arg(long, global = true, default_value = "err", value_parser = ["err", "warn", "info", "debug"])]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create OTG configuration with the specified item
    Create {
        #[command(subcommand)]
        item: Item,
    },
    /// Add an item to the OTG configuration read from stdin
    Add {
        #[command(subcommand)]
        item: Item,
    },
    /// Apply OTG configuration and run traffic flows, printing metrics as JSON lines
    Run(RunArgs),
    /// Transform raw OTG metrics into a format suitable for further processing
    Transform(TransformArgs),
    /// Display running test metrics as a chart or a table
    Display(DisplayArgs),
    /// Show otgen version
    Version(VersionArgs),
}

#[derive(Debug, Subcommand)]
enum Item {
    /// Emulated device with an ethernet and an IPv4 interface
    Device(DeviceArgs),
    /// Traffic flow between two ports or two devices
    Flow(FlowArgs),
    /// BGP configuration on an emulated device
    Bgp(BgpArgs),
}

#[derive(Debug, Args)]
struct DeviceArgs {
    /// Device name
    #[arg(short, long, default_value = defaults::DEVICE_NAME_1)]
    name: String,

    /// Test port name
    #[arg(short, long, default_value = defaults::PORT_NAME_P1)]
    port: String,

    /// Test port location string (default $OTG_LOCATION_<PORT> or localhost:5555/5556)
    #[arg(short, long)]
    location: Option<String>,

    /// Device MAC address
    #[arg(short = 'M', long)]
    mac: Option<String>,

    /// Device IP address
    #[arg(short = 'I', long)]
    ip: Option<String>,

    /// Device default gateway
    #[arg(short = 'G', long)]
    gw: Option<String>,

    /// Device network prefix
    #[arg(short = 'P', long, default_value_t = defaults::IPV4_DEFAULT_PREFIX)]
    prefix: u32,
}

impl From<DeviceArgs> for DeviceOptions {
    fn from(a: DeviceArgs) -> Self {
        DeviceOptions {
            name: a.name,
            port: a.port,
            location: a.location,
            mac: a.mac,
            ip: a.ip,
            gateway: a.gw,
            prefix: a.prefix,
        }
    }
}

#[derive(Debug, Args)]
struct FlowArgs {
    /// Flow name
    #[arg(short, long, default_value = defaults::FLOW_NAME_1)]
    name: String,

    /// Test port or device name for Tx
    #[arg(long, default_value = defaults::PORT_NAME_P1)]
    tx: String,

    /// Test port or device name for Rx (default is the opposite port)
    #[arg(long)]
    rx: Option<String>,

    /// Source MAC address
    #[arg(short = 'S', long)]
    smac: Option<String>,

    /// Destination MAC address
    #[arg(short = 'D', long)]
    dmac: Option<String>,

    /// IP Version 4 (default)
    #[arg(short = '4', long, conflicts_with = "ipv6")]
    ipv4: bool,

    /// IP Version 6
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Source IP address
    #[arg(short, long)]
    src: Option<String>,

    /// Destination IP address
    #[arg(short, long)]
    dst: Option<String>,

    /// IP transport protocol: icmp | tcp | udp
    #[arg(short = 'P', long, default_value = "tcp")]
    proto: Proto,

    /// Source TCP/UDP port; incrementing source ports when not set
    #[arg(long)]
    sport: Option<u32>,

    /// Destination TCP/UDP port
    #[arg(short = 'p', long, default_value_t = 7)]
    dport: u32,

    /// Packets per second; 0 leaves the rate to the traffic engine
    #[arg(short, long, default_value_t = 0)]
    rate: u64,

    /// Number of packets to transmit; 0 for continuous mode
    #[arg(short, long, default_value_t = 1000)]
    count: u64,

    /// Frame size in bytes; 0 leaves the size to the traffic engine
    #[arg(long, default_value_t = 0)]
    size: u64,

    /// Disable flow metrics
    #[arg(long)]
    nometrics: bool,

    /// Enable loss metrics
    #[arg(long)]
    loss: bool,

    /// Latency metrics: disable | sf (store_forward) | ct (cut_through)
    #[arg(long, default_value = "disable")]
    latency: LatencyMetrics,

    /// Enable metrics timestamps
    #[arg(long)]
    timestamps: bool,
}

impl From<FlowArgs> for FlowOptions {
    fn from(a: FlowArgs) -> Self {
        FlowOptions {
            name: a.name,
            tx: a.tx,
            rx: a.rx,
            src_mac: a.smac,
            dst_mac: a.dmac,
            ip_version: if a.ipv6 && !a.ipv4 { IpVersion::V6 } else { IpVersion::V4 },
            src: a.src,
            dst: a.dst,
            proto: a.proto,
            src_port: a.sport,
            dst_port: a.dport,
            rate: a.rate,
            count: a.count,
            size: a.size,
            disable_metrics: a.nometrics,
            loss: a.loss,
            latency: a.latency,
            timestamps: a.timestamps,
        }
    }
}

#[derive(Debug, Args)]
struct BgpArgs {
    /// Device name to add BGP configuration to
    #[arg(short, long, default_value = defaults::DEVICE_NAME_1)]
    device: String,

    /// Router ID (default is the address of the interface BGP is attached to)
    #[arg(long)]
    id: Option<String>,

    /// Autonomous System Number
    #[arg(long, default_value_t = defaults::BGP_ASN_DEFAULT)]
    asn: u32,

    /// Peer IP address (default is the gateway of the interface BGP is attached to)
    #[arg(short, long)]
    peer: Option<String>,

    /// BGP peering type: ebgp | ibgp
    #[arg(short = 't', long = "type", default_value = "ebgp", value_parser = parse_as_type)]
    as_type: BgpAsType,

    /// Route to advertise, a.b.c.d/nn
    #[arg(short, long, value_parser = parse_route)]
    route: Option<RouteSpec>,
}

impl From<BgpArgs> for BgpOptions {
    fn from(a: BgpArgs) -> Self {
        BgpOptions {
            device: a.device,
            router_id: a.id,
            asn: a.asn,
            peer: a.peer,
            as_type: a.as_type,
            route: a.route,
        }
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    /// URL of OTG API endpoint (default $OTG_API or https://localhost)
    #[arg(short, long)]
    api: Option<String>,

    /// Ignore X.509 certificate validation of OTG API endpoint
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Input is YAML (default)
    #[arg(short, long, conflicts_with = "json")]
    yaml: bool,

    /// Input is JSON
    #[arg(short, long)]
    json: bool,

    /// OTG configuration file; stdin when not set
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Metrics to report, comma-separated: port, flow, bgp4
    #[arg(short, long, default_value = "port")]
    metrics: MetricSelection,

    /// Interval to pull OTG metrics, e.g. 500ms, 1s
    #[arg(short, long, default_value = "0.5s", value_parser = parse_duration)]
    interval: Duration,

    /// Force traffic to stop after this many multiples of ETA; 0 for no limit
    #[arg(short = 'x', long, default_value_t = 0.0)]
    xeta: f64,

    /// Wall-clock limit for protocols and traffic, e.g. 1m30s
    #[arg(long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Protocol control: auto | ignore | keep
    #[arg(long, default_value = "auto")]
    protocols: ProtocolsMode,

    /// Routes each BGP peer must receive: N, or Nx times the advertised count
    #[arg(long, default_value = "1x")]
    rxbgp: RxBgp,
}

impl From<RunArgs> for RunSettings {
    fn from(a: RunArgs) -> Self {
        let env: Env = &defaults::process_env;
        RunSettings {
            api: a.api.unwrap_or_else(|| defaults::api_location(env)),
            insecure: a.insecure,
            file: a.file,
            format: match (a.yaml, a.json) {
                (false, true) => DocFormat::Json,
                _ => DocFormat::Yaml,
            },
            metrics: a.metrics,
            interval: a.interval,
            xeta: a.xeta,
            timeout: a.timeout,
            protocols: a.protocols,
            rx_bgp: a.rxbgp,
        }
    }
}

#[derive(Debug, Args)]
struct TransformArgs {
    /// Template file; exclusive with --metrics and --counters
    #[arg(short, long, conflicts_with_all = ["metrics", "counters"])]
    file: Option<PathBuf>,

    /// Metrics type to transform: port | flow
    #[arg(short, long)]
    metrics: Option<TransformMetric>,

    /// Counters: frames | bytes | pps | tput | Kbps | Mbps | Gbps | Tbps
    #[arg(short, long)]
    counters: Option<Counter>,
}

#[derive(Debug, Args)]
struct DisplayArgs {
    /// Display mode: chart | table
    #[arg(short, long, default_value = "chart")]
    mode: DisplayMode,

    /// Chart type: line (chart mode only)
    #[arg(short = 't', long = "type")]
    chart_type: Option<ChartType>,
}

#[derive(Debug, Args)]
struct VersionArgs {
    /// Do not check for updates
    #[arg(short, long)]
    nocheck: bool,
}

fn init_tracing(level: &str) {
    let directive = match level {
        "err" => "error",
        other => other,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();
}

/// `create` starts from an empty config, `add` from the document on stdin.
fn edit_config(item: Item, from_stdin: bool) -> Result<()> {
    let mut config = if from_stdin {
        parse_config(&read_source(None)?, DocFormat::Yaml)?
    } else {
        Config::default()
    };
    let env: Env = &defaults::process_env;
    match item {
        Item::Device(a) => apply_device(&mut config, &a.into(), env)?,
        Item::Flow(a) => apply_flow(&mut config, &a.into(), env)?,
        Item::Bgp(a) => apply_bgp(&mut config, &a.into())?,
    }
    let mut out = io::stdout().lock();
    out.write_all(to_yaml(&config)?.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Returns false when the command finished but should exit non-zero.
fn dispatch(command: Command) -> Result<bool> {
    match command {
        Command::Create { item } => edit_config(item, false)?,
        Command::Add { item } => edit_config(item, true)?,
        Command::Run(args) => {
            let settings = RunSettings::from(args);
            let outcome = run::run_document(&settings, &mut io::stdout().lock())?;
            info!(?outcome, "run finished");
            return Ok(outcome.is_success());
        }
        Command::Transform(args) => {
            let opts = TransformOptions {
                metrics: args.metrics,
                counters: args.counters,
                template_file: args.file,
            };
            let source = TemplateSource::select(&opts)?;
            let transformer = Transformer::new(&source, opts.counters.unwrap_or_default())?;
            transformer.transform(io::stdin().lock(), &mut io::stdout().lock())?;
        }
        Command::Display(args) => display::run(&DisplayOptions {
            mode: args.mode,
            chart_type: args.chart_type,
        })?,
        Command::Version(args) => version::run(!args.nocheck, &mut io::stdout().lock())?,
    }
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match dispatch(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
