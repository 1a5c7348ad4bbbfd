use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use eventpipe_provider::coreclr::{coreclr_providers, CoreClrProviderProps};
use eventpipe_provider::{parse_provider_list, ProviderError, ProviderSpec};

#[derive(Debug, Parser)]
#[command(
    name = "eventpipe-providers",
    version,
    about = "Parse EventPipe provider descriptors and build the CoreCLR provider set."
)]
struct Opt {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Parse provider descriptors and print them with every field filled in.
    Parse(ParseArgs),

    /// Print the providers a profiler enables for .NET processes.
    Coreclr(CoreClrArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Descriptors of the form name[:keywords-hex[:level[:filter data]]].
    /// Each argument may hold several, separated by commas.
    #[arg(required = true)]
    descriptors: Vec<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct CoreClrArgs {
    /// The process is already running; request a rundown of loaded methods.
    #[arg(long)]
    attach: bool,

    /// Enable GC markers.
    #[arg(long)]
    gc_markers: bool,

    /// Enable GC suspension markers.
    #[arg(long)]
    gc_suspensions: bool,

    /// Enable sampled object allocation events.
    #[arg(long)]
    gc_detailed_allocs: bool,

    /// Capture a stack with every runtime event.
    #[arg(long)]
    event_stacks: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Print a JSON array instead of one descriptor per line.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum ToolError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Failed to serialize providers: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreClrArgs {
    fn to_provider_props(&self) -> CoreClrProviderProps {
        CoreClrProviderProps {
            is_attach: self.attach,
            gc_markers: self.gc_markers,
            gc_suspensions: self.gc_suspensions,
            gc_detailed_allocs: self.gc_detailed_allocs,
            event_stacks: self.event_stacks,
        }
    }
}

fn main() {
    env_logger::init();

    let opt = Opt::parse();
    let result = match opt.action {
        Action::Parse(args) => parse_descriptors(&args.descriptors)
            .map_err(ToolError::from)
            .and_then(|providers| print_providers(&providers, &args.output)),
        Action::Coreclr(args) => {
            let props = args.to_provider_props();
            log::debug!("CoreCLR provider props: {:?}", props);
            print_providers(&coreclr_providers(&props), &args.output)
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn parse_descriptors(descriptors: &[String]) -> Result<Vec<ProviderSpec>, ProviderError> {
    let mut providers = Vec::new();
    for descriptor in descriptors {
        let parsed = parse_provider_list(descriptor)?;
        log::info!("{:?}: {} provider(s)", descriptor, parsed.len());
        providers.extend(parsed);
    }
    Ok(providers)
}

fn print_providers(providers: &[ProviderSpec], output: &OutputArgs) -> Result<(), ToolError> {
    println!("{}", render_providers(providers, output)?);
    Ok(())
}

fn render_providers(providers: &[ProviderSpec], output: &OutputArgs) -> Result<String, ToolError> {
    if output.json {
        return Ok(serde_json::to_string_pretty(providers)?);
    }

    Ok(providers
        .iter()
        .map(ProviderSpec::to_descriptor)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Opt::command().debug_assert();
    }

    #[test]
    fn coreclr_flags_map_to_props() {
        let opt = Opt::parse_from([
            "eventpipe-providers",
            "coreclr",
            "--attach",
            "--gc-detailed-allocs",
        ]);
        let Action::Coreclr(args) = opt.action else {
            panic!("expected coreclr action");
        };
        let props = args.to_provider_props();
        assert!(props.is_attach);
        assert!(props.gc_detailed_allocs);
        assert!(!props.gc_markers);
        assert!(!args.output.json);
    }

    #[test]
    fn parse_flattens_lists() {
        let providers =
            parse_descriptors(&["A:0x1:4,B".to_string(), "C::2:x".to_string()]).unwrap();
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn renders_text_and_json() {
        let providers = parse_descriptors(&["A:0x1:4".to_string(), "B".to_string()]).unwrap();

        let text = render_providers(&providers, &OutputArgs { json: false }).unwrap();
        assert_eq!(text, "A:0x1:4\nB:0xffffffffffffffff:5");

        let json = render_providers(&providers, &OutputArgs { json: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "A");
        assert_eq!(value[1]["level"], "Verbose");
    }

    #[test]
    fn errors_become_tool_errors() {
        let err: ToolError = parse_descriptors(&["B:xyz".to_string()]).unwrap_err().into();
        assert!(matches!(err, ToolError::Provider(_)));

        let err: ToolError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("Failed to serialize providers"));
    }

    #[test]
    fn parse_stops_at_first_bad_descriptor() {
        let err = parse_descriptors(&["A".to_string(), "B:xyz".to_string()]).unwrap_err();
        assert!(err.is_numeric_conversion());
    }
}
