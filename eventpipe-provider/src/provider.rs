use std::fmt::Display;
use std::str::FromStr;

use serde_derive::Serialize;

use crate::{EventLevel, ProviderError};

/// Every keyword enabled.
pub const ALL_KEYWORDS: u64 = u64::MAX;

const FIELD_SEPARATOR: char = ':';
const LIST_SEPARATOR: char = ',';

// name, keywords, level, filter data; the last one keeps any further ':'
const MAX_FIELDS: usize = 4;

/// The optional parts of a provider. `Default` enables every keyword at
/// `Verbose` with no filter data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    pub keywords: u64,
    pub level: EventLevel,
    pub filter_data: Option<String>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        ProviderOptions {
            keywords: ALL_KEYWORDS,
            level: EventLevel::Verbose,
            filter_data: None,
        }
    }
}

impl ProviderOptions {
    pub fn keywords(mut self, keywords: u64) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    pub fn filter_data(mut self, filter_data: impl Into<String>) -> Self {
        self.filter_data = Some(filter_data.into());
        self
    }
}

/// One event provider to enable on a tracing session.
///
/// The textual form is `<name>[:<keywords-hex>[:<level>[:<filter data>]]]`,
/// e.g. `Microsoft-Windows-DotNETRuntime:0x10:5`. A spec is validated when it
/// is built and never changes afterwards.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct ProviderSpec {
    name: String,
    keywords: u64,
    level: EventLevel,
    filter_data: Option<String>,
}

impl ProviderSpec {
    /// A provider with every keyword enabled at `Verbose`.
    pub fn new(name: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_options(name, ProviderOptions::default())
    }

    /// Fails if `name` is empty or only whitespace. Filter data that is empty
    /// or only whitespace is dropped; anything else is kept as given.
    pub fn with_options(
        name: impl Into<String>,
        options: ProviderOptions,
    ) -> Result<Self, ProviderError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProviderError::MissingName);
        }

        let filter_data = options
            .filter_data
            .filter(|filter_data| !filter_data.trim().is_empty());

        Ok(ProviderSpec {
            name,
            keywords: options.keywords,
            level: options.level,
            filter_data,
        })
    }

    /// Parses a single provider descriptor.
    ///
    /// Missing trailing fields take their defaults. A keywords field that is
    /// present but not a 64-bit hex number (an optional `+` and then an
    /// optional `0x` prefix are allowed) is an error, while a level that is not a known number quietly becomes
    /// `Verbose`. An empty keywords field counts as missing rather than
    /// failing the hex conversion. Everything after
    /// the third `:` is filter data, colons included.
    pub fn parse(descriptor: &str) -> Result<Self, ProviderError> {
        if descriptor.trim().is_empty() {
            return Err(ProviderError::EmptyDescriptor);
        }

        let fields: Vec<&str> = descriptor.splitn(MAX_FIELDS, FIELD_SEPARATOR).collect();

        let name = match fields.first() {
            Some(name) if !name.trim().is_empty() => *name,
            _ => return Err(ProviderError::MissingName),
        };

        let keywords = match fields.get(1) {
            Some(field) if !field.is_empty() => parse_keywords(field)?,
            _ => ALL_KEYWORDS,
        };

        let level = match fields.get(2) {
            Some(field) => parse_level(field).unwrap_or_else(|| {
                log::debug!(
                    "Provider {}: unrecognized level {:?}, using {}",
                    name,
                    field,
                    EventLevel::Verbose
                );
                EventLevel::Verbose
            }),
            None => EventLevel::Verbose,
        };

        let filter_data = fields.get(3).map(|field| field.to_string());

        Self::with_options(
            name,
            ProviderOptions {
                keywords,
                level,
                filter_data,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> u64 {
        self.keywords
    }

    pub fn level(&self) -> EventLevel {
        self.level
    }

    pub fn filter_data(&self) -> Option<&str> {
        self.filter_data.as_deref()
    }

    /// Renders the spec in descriptor form, with every field spelled out.
    /// Parsing the result gives back an equal spec unless the name itself
    /// contains a `:`.
    pub fn to_descriptor(&self) -> String {
        self.to_string()
    }
}

impl Display for ProviderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:0x{:x}:{}",
            self.name,
            self.keywords,
            self.level.as_u32()
        )?;
        if let Some(filter_data) = &self.filter_data {
            write!(f, ":{}", filter_data)?;
        }
        Ok(())
    }
}

impl FromStr for ProviderSpec {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderSpec::parse(s)
    }
}

/// Parses a comma separated list of descriptors, as taken by `--providers`
/// style options. Blank entries are skipped and each entry is trimmed, so
/// filter data cannot contain `,` in this form.
pub fn parse_provider_list(list: &str) -> Result<Vec<ProviderSpec>, ProviderError> {
    let providers = list
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(index, entry)| {
            ProviderSpec::parse(entry).map_err(|source| ProviderError::InvalidListEntry {
                index,
                source: Box::new(source),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if providers.is_empty() {
        return Err(ProviderError::EmptyDescriptor);
    }
    Ok(providers)
}

fn parse_keywords(field: &str) -> Result<u64, ProviderError> {
    // [+][0x|0X]<hex digits>
    let unsigned = field.strip_prefix('+').unwrap_or(field);
    let digits = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .unwrap_or(unsigned);
    // A sign left here sits after the prefix or is a second sign, which
    // from_str_radix rejects when given the whole field.
    let text = if digits.starts_with(['+', '-']) {
        field
    } else {
        digits
    };
    u64::from_str_radix(text, 16).map_err(|source| ProviderError::InvalidKeywords {
        value: field.to_string(),
        source,
    })
}

fn parse_level(field: &str) -> Option<EventLevel> {
    let value: u32 = field.trim().parse().ok()?;
    EventLevel::from_u32(value)
}
