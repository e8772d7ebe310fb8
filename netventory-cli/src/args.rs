use clap::Parser;

/// netventory: network inventory and risk assessment scanner
#[derive(Parser, Debug)]
#[command(
    name = "netventory",
    version,
    about = "Discover devices on a network segment and assess their exposure"
)]
pub struct Args {
    /// Target: IP address, CIDR block, last-octet range, or hostname
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Timing template (0-5): 0=paranoid through 5=insane
    #[arg(short = 'T', value_name = "0-5", default_value = "4", value_parser = clap::value_parser!(u8).range(0..=5))]
    pub timing: u8,

    /// SNMP community handed to the hardware-enrichment stage
    #[arg(long = "snmp-community", value_name = "NAME", default_value = "public")]
    pub snmp_community: String,

    /// Run the combined risk analysis and print a report per device
    #[arg(long)]
    pub risk: bool,

    /// Print the fleet-wide security summary after the device list
    #[arg(long)]
    pub summary: bool,

    /// Emit results as JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity level (use -v or -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
