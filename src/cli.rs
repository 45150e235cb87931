use crate::domain::Filter;
use crate::transport::TransportKind;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "ipcmanview-feed", version, about = "Follows the live event feed of IPCManView camera devices")]
pub struct Cli {
    /// Filter as a shared query string, e.g. "codes=VideoMotion&actions=start"
    #[arg(long, env = "IPCMANVIEW_FILTER")]
    pub filter: Option<String>,

    /// Only show events of this device, can be repeated
    #[arg(long = "device-uuid", value_name = "UUID")]
    pub device_uuids: Vec<String>,

    /// Only show events with this code, can be repeated
    #[arg(long = "code")]
    pub codes: Vec<String>,

    /// Only show events with this action, can be repeated
    #[arg(long = "action")]
    pub actions: Vec<String>,

    /// Show the payload of every row
    #[arg(long)]
    pub expanded: bool,

    #[arg(long, value_enum, default_value_t = TransportKind::Sse)]
    pub transport: TransportKind,

    /// Append to the terminal instead of redrawing the screen
    #[arg(long)]
    pub no_clear: bool,
}

impl Cli {
    /// The shared query string combined with the individual flags.
    pub fn initial_filter(&self) -> Filter {
        let shared = self.filter.as_deref().map(Filter::from_query_string).unwrap_or_default();
        shared.merge(Filter::new(self.device_uuids.clone(), self.codes.clone(), self.actions.clone()))
    }
}
