//! Profiler configuration (TOML)
//!
//! ```toml
//! traversal = "breadth-first"
//!
//! [profile]
//! preset = "wide"
//! object_header = 12
//!
//! [flyweights]
//! standard = true
//! shared_types = ["Locale", "TimeZone"]
//!
//! [workarounds]
//! Socket = 40
//! ```
//!
//! Every key is optional; an empty document yields the default profiler.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::flyweight::FlyweightRegistry;
use crate::metadata::MetadataCache;
use crate::profile::SizeProfile;
use crate::profiler::ObjectProfiler;
use crate::traverse::TraversalOrder;
use crate::workaround::WorkaroundTable;

/// `[profile]` table as written
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProfileSection {
    preset: Option<String>,
    object_header: Option<u64>,
    reference: Option<u64>,
    array_length: Option<u64>,
    boolean: Option<u64>,
    byte: Option<u64>,
    char: Option<u64>,
    short: Option<u64>,
    int: Option<u64>,
    float: Option<u64>,
    long: Option<u64>,
    double: Option<u64>,
}

impl ProfileSection {
    fn resolve(self) -> Result<SizeProfile, ConfigError> {
        let mut profile = match self.preset.as_deref() {
            Some(name) => SizeProfile::preset(name)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown profile preset: {}", name)))?,
            None => SizeProfile::narrow(),
        };

        let overrides = [
            (&mut profile.object_header, self.object_header),
            (&mut profile.reference, self.reference),
            (&mut profile.array_length, self.array_length),
            (&mut profile.boolean, self.boolean),
            (&mut profile.byte, self.byte),
            (&mut profile.char, self.char),
            (&mut profile.short, self.short),
            (&mut profile.int, self.int),
            (&mut profile.float, self.float),
            (&mut profile.long, self.long),
            (&mut profile.double, self.double),
        ];
        for (slot, value) in overrides {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if profile.object_header == 0 {
            return Err(ConfigError::Invalid("object_header must be positive".to_string()));
        }
        if profile.reference == 0 {
            return Err(ConfigError::Invalid("reference must be positive".to_string()));
        }
        Ok(profile)
    }
}

/// `[flyweights]` table
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FlyweightSection {
    standard: bool,
    shared_types: Vec<String>,
}

impl Default for FlyweightSection {
    fn default() -> Self {
        Self {
            standard: true,
            shared_types: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    traversal: TraversalOrder,
    profile: ProfileSection,
    flyweights: FlyweightSection,
    workarounds: BTreeMap<String, u64>,
}

/// Validated profiler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Work queue discipline
    pub traversal: TraversalOrder,
    /// Size constants
    pub profile: SizeProfile,
    /// Pre-load the standard shared type names
    pub standard_flyweights: bool,
    /// Additional shared type names
    pub shared_types: Vec<String>,
    /// Workaround entries added on top of the standard table
    pub workarounds: BTreeMap<String, u64>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            traversal: TraversalOrder::default(),
            profile: SizeProfile::narrow(),
            standard_flyweights: true,
            shared_types: Vec::new(),
            workarounds: BTreeMap::new(),
        }
    }
}

impl ProfilerConfig {
    /// Parse a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let config = Self {
            traversal: raw.traversal,
            profile: raw.profile.resolve()?,
            standard_flyweights: raw.flyweights.standard,
            shared_types: raw.flyweights.shared_types,
            workarounds: raw.workarounds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(
            "loaded profiler configuration from {}: {:?} traversal, {} shared types, {} workarounds",
            path.display(),
            config.traversal,
            config.shared_types.len(),
            config.workarounds.len()
        );
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self.shared_types.iter().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "shared type name cannot be blank: {:?}",
                name
            )));
        }
        if self.workarounds.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "workaround type name cannot be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Flyweight registry described by this configuration
    pub fn flyweights(&self) -> FlyweightRegistry {
        let registry = if self.standard_flyweights {
            FlyweightRegistry::standard()
        } else {
            FlyweightRegistry::new()
        };
        registry.extend_shared_types(self.shared_types.iter().cloned());
        registry
    }

    /// Configured workarounds that never apply because the type is shared
    ///
    /// The flyweight check runs before the workaround table, so these
    /// entries are dead weight.
    pub fn shadowed_workarounds(&self) -> Vec<&str> {
        let flyweights = self.flyweights();
        self.workarounds
            .keys()
            .filter(|name| flyweights.is_shared_type(name))
            .map(String::as_str)
            .collect()
    }

    /// Workaround table described by this configuration
    pub fn workaround_table(&self) -> WorkaroundTable {
        for name in self.shadowed_workarounds() {
            log::warn!(
                "workaround for {} is ignored: its instances are shared flyweights",
                name
            );
        }
        let mut table = WorkaroundTable::standard(&self.profile);
        for (name, size) in &self.workarounds {
            table.insert(name.clone(), *size);
        }
        table
    }

    /// Build a profiler backed by the global metadata cache
    pub fn build_profiler(&self) -> ObjectProfiler {
        self.build_profiler_with_cache(MetadataCache::global())
    }

    /// Build a profiler backed by `cache`
    pub fn build_profiler_with_cache(&self, cache: Arc<MetadataCache>) -> ObjectProfiler {
        ObjectProfiler::with_profile(self.profile)
            .with_flyweights(Arc::new(self.flyweights()))
            .with_workarounds(self.workaround_table())
            .with_cache(cache)
            .with_order(self.traversal)
    }
}
