use std::path::PathBuf;

use clap::Parser;

use crate::config::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "testability-classpath",
    about = "Assemble the analysis classpath of a Maven project and the testability plugin",
    version
)]
pub struct Cli {
    /// Project directory or pom.xml
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Config file [default: ./.testability/config.toml, fallback ~/.config/testability/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Local repository [default: ~/.m2/repository]
    #[arg(long, value_name = "DIR")]
    pub local_repo: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Analysis output format forwarded to the engine
    #[arg(long, value_name = "FMT")]
    pub format: Option<FormatArg>,

    /// Also compute the coverage classpath
    #[arg(long)]
    pub coverage: bool,

    /// Do not resolve the project's own dependencies
    #[arg(long)]
    pub no_resolve: bool,

    /// Show every classpath entry and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    Plain,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum FormatArg {
    Xml,
    Summary,
    Source,
    Detail,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xml => OutputFormat::Xml,
            FormatArg::Summary => OutputFormat::Summary,
            FormatArg::Source => OutputFormat::Source,
            FormatArg::Detail => OutputFormat::Detail,
        }
    }
}
