use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::ops::BitOr;
use std::path::PathBuf;

/// Bitmask of the metadata/content components mixed into the composite hash.
///
/// The integer encoding is persisted in the index (`hash_components` config
/// key) and must stay stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashComponents(u32);

impl HashComponents {
    pub const CONTENT: HashComponents = HashComponents(1);
    pub const SIZE: HashComponents = HashComponents(2);
    pub const MODIFIED: HashComponents = HashComponents(4);
    pub const CREATED: HashComponents = HashComponents(8);
    pub const FILE_NAME: HashComponents = HashComponents(16);

    const ALL_BITS: u32 = 31;

    pub const fn empty() -> Self {
        HashComponents(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Unknown bits are dropped so a downgraded index stays readable.
    pub const fn from_bits(bits: u32) -> Self {
        HashComponents(bits & Self::ALL_BITS)
    }

    pub const fn contains(self, other: HashComponents) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, component: HashComponents, enabled: bool) {
        if enabled {
            self.0 |= component.0;
        } else {
            self.0 &= !component.0;
        }
    }
}

impl Default for HashComponents {
    fn default() -> Self {
        HashComponents::SIZE
    }
}

impl BitOr for HashComponents {
    type Output = HashComponents;

    fn bitor(self, rhs: HashComponents) -> HashComponents {
        HashComponents(self.0 | rhs.0)
    }
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub components: HashComponents,
    pub workers: usize,
    pub full_scan: bool,
    pub ignore_patterns: Vec<String>,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            db_path: PathBuf::from(".dups.db"),
            components: HashComponents::default(),
            workers: num_cpus::get(),
            full_scan: false,
            ignore_patterns: Vec::new(),
        }
    }
}

/// Optional on-disk defaults, merged under CLI flags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default)]
    pub workers: Option<usize>,
}

pub fn load_configuration() -> Result<FileConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Dupehound").required(false))
        .build()?;
    builder.try_deserialize::<FileConfig>()
}
