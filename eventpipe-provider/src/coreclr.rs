use bitflags::bitflags;

use crate::{EventLevel, ProviderError, ProviderOptions, ProviderSpec};

pub const CORECLR_RUNTIME_PROVIDER: &str = "Microsoft-Windows-DotNETRuntime";
pub const CORECLR_RUNDOWN_PROVIDER: &str = "Microsoft-Windows-DotNETRuntimeRundown";

bitflags! {
    /// Keywords of the CoreCLR runtime and rundown providers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClrKeywords: u64 {
        const GC = 0x1; // https://learn.microsoft.com/en-us/dotnet/fundamentals/diagnostics/runtime-garbage-collection-events
        const GC_HANDLE = 0x2;
        const BINDER = 0x4; // https://learn.microsoft.com/en-us/dotnet/fundamentals/diagnostics/runtime-loader-binder-events
        const LOADER = 0x8;
        const JIT = 0x10; // https://learn.microsoft.com/en-us/dotnet/fundamentals/diagnostics/runtime-method-events
        const NGEN = 0x20;
        const RUNDOWN_START = 0x40;
        const INTEROP = 0x2000; // https://learn.microsoft.com/en-us/dotnet/fundamentals/diagnostics/runtime-interop-events
        const CONTENTION = 0x4000;
        const EXCEPTION = 0x8000; // https://learn.microsoft.com/en-us/dotnet/fundamentals/diagnostics/runtime-exception-events
        const THREADING = 0x10000; // https://learn.microsoft.com/en-us/dotnet/fundamentals/diagnostics/runtime-thread-events
        const JIT_TO_NATIVE_METHOD_MAP = 0x20000;
        const GC_SAMPLED_OBJECT_ALLOCATION_HIGH = 0x200000;
        const GC_HEAP_AND_TYPE_NAMES = 0x1000000;
        const GC_SAMPLED_OBJECT_ALLOCATION_LOW = 0x2000000;
        const STACK = 0x40000000; // https://learn.microsoft.com/en-us/dotnet/framework/performance/stack-etw-event
        const COMPILATION = 0x1000000000;
        const COMPILATION_DIAGNOSTIC = 0x2000000000;
        const TYPE_DIAGNOSTIC = 0x8000000000;
    }
}

/// What a profiling session wants to see from the runtime.
#[derive(Debug, Clone, Default)]
pub struct CoreClrProviderProps {
    pub is_attach: bool,
    pub gc_markers: bool,
    pub gc_suspensions: bool,
    pub gc_detailed_allocs: bool,
    pub event_stacks: bool,
}

impl CoreClrProviderProps {
    pub fn any_gc(&self) -> bool {
        self.gc_markers || self.gc_suspensions || self.gc_detailed_allocs
    }
}

/// Given a set of CoreClrProviderProps, return the providers to enable.
pub fn coreclr_providers(props: &CoreClrProviderProps) -> Vec<ProviderSpec> {
    // Enabling all the DotNETRuntime keywords is very expensive. NGen in particular
    // generates info for every NGen'd method, which the native PDB info from
    // ModuleLoad already gives us.
    //
    // JIT MethodLoad only carries method names at Verbose, so everything goes
    // on the verbose provider.
    let mut runtime_keywords = ClrKeywords::JIT
        | ClrKeywords::NGEN
        | ClrKeywords::LOADER
        | ClrKeywords::COMPILATION_DIAGNOSTIC
        | ClrKeywords::JIT_TO_NATIVE_METHOD_MAP;

    // with STACK, every CoreCLR event is followed by a stack event
    if props.event_stacks {
        runtime_keywords |= ClrKeywords::STACK;
    }
    if props.any_gc() {
        runtime_keywords |= ClrKeywords::GC;
    }
    if props.gc_detailed_allocs {
        runtime_keywords |= ClrKeywords::GC_SAMPLED_OBJECT_ALLOCATION_HIGH
            | ClrKeywords::GC_SAMPLED_OBJECT_ALLOCATION_LOW;
    }

    // When attaching, ask for a rundown of already loaded modules and methods.
    let rundown_keywords = if props.is_attach {
        ClrKeywords::LOADER | ClrKeywords::JIT | ClrKeywords::NGEN | ClrKeywords::RUNDOWN_START
    } else {
        ClrKeywords::JIT | ClrKeywords::NGEN
    };

    [
        (CORECLR_RUNTIME_PROVIDER, runtime_keywords),
        (CORECLR_RUNDOWN_PROVIDER, rundown_keywords),
    ]
    .into_iter()
    .filter(|(_, keywords)| !keywords.is_empty())
    .filter_map(|(name, keywords)| {
        clr_provider(name, keywords, EventLevel::Verbose)
            .map_err(|e| log::warn!("Skipping provider {}: {}", name, e))
            .ok()
    })
    .collect()
}

/// The same providers as [`coreclr_providers`], as descriptor strings for
/// tools such as xperf or dotnet-trace.
pub fn coreclr_provider_args(props: &CoreClrProviderProps) -> Vec<String> {
    coreclr_providers(props)
        .iter()
        .map(ProviderSpec::to_descriptor)
        .collect()
}

pub fn clr_provider(
    name: &str,
    keywords: ClrKeywords,
    level: EventLevel,
) -> Result<ProviderSpec, ProviderError> {
    ProviderSpec::with_options(
        name,
        ProviderOptions::default()
            .keywords(keywords.bits())
            .level(level),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_without_extras() {
        let args = coreclr_provider_args(&CoreClrProviderProps::default());
        assert_eq!(
            args,
            vec![
                "Microsoft-Windows-DotNETRuntime:0x2000020038:5".to_string(),
                "Microsoft-Windows-DotNETRuntimeRundown:0x30:5".to_string(),
            ]
        );
    }

    #[test]
    fn attach_requests_rundown_start() {
        let props = CoreClrProviderProps {
            is_attach: true,
            ..Default::default()
        };
        let providers = coreclr_providers(&props);
        let rundown = ClrKeywords::from_bits_truncate(providers[1].keywords());
        assert!(rundown.contains(ClrKeywords::RUNDOWN_START | ClrKeywords::LOADER));
    }

    #[test]
    fn gc_and_stacks() {
        let props = CoreClrProviderProps {
            gc_detailed_allocs: true,
            event_stacks: true,
            ..Default::default()
        };
        let providers = coreclr_providers(&props);
        assert_eq!(providers[0].name(), CORECLR_RUNTIME_PROVIDER);
        let runtime = ClrKeywords::from_bits_truncate(providers[0].keywords());
        assert!(runtime.contains(
            ClrKeywords::GC
                | ClrKeywords::STACK
                | ClrKeywords::GC_SAMPLED_OBJECT_ALLOCATION_HIGH
                | ClrKeywords::GC_SAMPLED_OBJECT_ALLOCATION_LOW
        ));
        assert!(!runtime.contains(ClrKeywords::EXCEPTION));
        assert_eq!(providers[0].level(), EventLevel::Verbose);
    }

    #[test]
    fn args_parse_back() {
        let props = CoreClrProviderProps {
            is_attach: true,
            gc_markers: true,
            ..Default::default()
        };
        for (arg, spec) in coreclr_provider_args(&props)
            .iter()
            .zip(coreclr_providers(&props))
        {
            assert_eq!(ProviderSpec::parse(arg).unwrap(), spec);
        }
    }
}
