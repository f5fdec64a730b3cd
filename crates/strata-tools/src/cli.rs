use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use strata_selection::{ConversionPolicy, ElementType, IndexArrayKind, TopologyType};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, ValueEnum)]
pub enum LogFormat {
    Compact,
    Full,
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => f.write_str("compact"),
            LogFormat::Full => f.write_str("full"),
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "strata", author, version, about)]
pub struct Cli {
    /// Logging output filters; comma-separated
    #[arg(
        short,
        long,
        global = true,
        default_value = "warn,strata_gltf=info,strata_selection=info",
        env = "STRATA_LOG_FILTER"
    )]
    pub log_filter: String,
    /// Logging output format
    #[arg(long, global = true, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a .gltf or .glb file and print a summary plus the import messages
    Inspect(InspectArgs),
    /// Convert an index array over one mesh primitive into a selection
    Select(SelectArgs),
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// The .gltf or .glb file
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
    /// Read external image files
    #[arg(long)]
    pub load_image_data: bool,
    /// Keep the string extras of the asset object
    #[arg(long)]
    pub load_metadata: bool,
    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// The .gltf or .glb file
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
    /// Mesh index
    #[arg(long, default_value_t = 0)]
    pub mesh: usize,
    /// Primitive index within the mesh
    #[arg(long, default_value_t = 0)]
    pub primitive: usize,
    /// What the input indices name
    #[arg(long, value_enum, default_value_t = IndexKindArg::Triangles)]
    pub from: IndexKindArg,
    /// Input indices; comma-separated
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub indices: Vec<u32>,
    /// Element type of the resulting selection
    #[arg(long, value_enum, default_value_t = ElementArg::Face)]
    pub to: ElementArg,
    /// Topology of the resulting selection
    #[arg(long, value_enum, default_value_t = TopologyArg::Triangle)]
    pub topology: TopologyArg,
    /// Treatment of partially covered elements
    #[arg(long, value_enum, default_value_t = PolicyArg::Contain)]
    pub policy: PolicyArg,
    /// Consecutive triangles forming one polygroup
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub group_size: u32,
    /// Grow the selection by this many rings
    #[arg(long, conflicts_with = "contract")]
    pub expand: Option<u32>,
    /// Shrink the selection by this many rings
    #[arg(long)]
    pub contract: Option<u32>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum IndexKindArg {
    Vertices,
    Triangles,
    Polygroups,
}

impl From<IndexKindArg> for IndexArrayKind {
    fn from(arg: IndexKindArg) -> Self {
        match arg {
            IndexKindArg::Vertices => IndexArrayKind::Vertices,
            IndexKindArg::Triangles => IndexArrayKind::Triangles,
            IndexKindArg::Polygroups => IndexArrayKind::Polygroups,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum ElementArg {
    Vertex,
    Edge,
    Face,
}

impl From<ElementArg> for ElementType {
    fn from(arg: ElementArg) -> Self {
        match arg {
            ElementArg::Vertex => ElementType::Vertex,
            ElementArg::Edge => ElementType::Edge,
            ElementArg::Face => ElementType::Face,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum TopologyArg {
    Triangle,
    Polygroup,
}

impl From<TopologyArg> for TopologyType {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Triangle => TopologyType::Triangle,
            TopologyArg::Polygroup => TopologyType::Polygroup,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum PolicyArg {
    Expand,
    Contain,
}

impl From<PolicyArg> for ConversionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Expand => ConversionPolicy::Expand,
            PolicyArg::Contain => ConversionPolicy::Contain,
        }
    }
}

/// Set up log output on stderr
pub(crate) fn initialize_tracing(log_filter: &str, log_format: LogFormat) {
    let tsub = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_env_filter(log_filter);

    match log_format {
        LogFormat::Compact => tsub.compact().init(),
        LogFormat::Full => tsub.init(),
        LogFormat::Pretty => tsub.pretty().init(),
        LogFormat::Json => tsub.json().init(),
    }
}
