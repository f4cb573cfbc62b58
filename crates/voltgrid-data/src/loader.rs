//! Format detection, file discovery and the top-level loading pipeline.
//!
//! Each data file may be written in RON, TOML or JSON; the extension decides
//! which. Two files with the same base name but different extensions are an
//! error rather than a silent pick.

use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use voltgrid_network::config::NetworkConfig;

use crate::catalog::{NodeCatalog, NodeTemplate, TierSpec, TierTable};
use crate::schema::{NodeData, StorageTierData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The file parsed but its contents are not usable.
    #[error("invalid data in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if none exists and `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. TOML files hold the array under
/// `toml_key` in a top-level table; RON and JSON hold it directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Everything loaded from a data directory.
#[derive(Debug, Clone, Default)]
pub struct VoltgridData {
    pub network: NetworkConfig,
    pub tiers: TierTable,
    pub nodes: NodeCatalog,
}

/// Load `network.*`, `storage_tiers.*` and `nodes.*` from `dir`.
///
/// Missing files yield defaults. Node templates are resolved against the
/// tier table after its overrides are applied.
pub fn load_voltgrid_data(dir: &Path) -> Result<VoltgridData, DataLoadError> {
    let network = match find_data_file(dir, "network")? {
        Some(path) => load_network_config(&path)?,
        None => NetworkConfig::default(),
    };
    let tiers = match find_data_file(dir, "storage_tiers")? {
        Some(path) => load_tier_table(&path)?,
        None => TierTable::default(),
    };
    let nodes = match find_data_file(dir, "nodes")? {
        Some(path) => load_node_catalog(&path, &tiers)?,
        None => NodeCatalog::default(),
    };

    debug!(dir = %dir.display(), nodes = nodes.len(), "voltgrid data loaded");
    Ok(VoltgridData {
        network,
        tiers,
        nodes,
    })
}

/// Load and validate a network configuration file.
pub fn load_network_config(path: &Path) -> Result<NetworkConfig, DataLoadError> {
    let config: NetworkConfig = deserialize_file(path)?;
    config.validate().map_err(|e| DataLoadError::Invalid {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(config)
}

/// Apply a file of tier overrides on top of the built-in tiers.
pub fn load_tier_table(path: &Path) -> Result<TierTable, DataLoadError> {
    let overrides: Vec<StorageTierData> = deserialize_list(path, "tiers")?;
    let mut table = TierTable::default();
    let mut seen = BTreeSet::new();

    for entry in overrides {
        if !seen.insert(entry.tier) {
            return Err(DataLoadError::DuplicateName {
                file: path.to_path_buf(),
                name: format!("{:?}", entry.tier).to_lowercase(),
            });
        }
        let base = table.get(entry.tier);
        table.set(
            entry.tier,
            TierSpec {
                capacity: entry.capacity.unwrap_or(base.capacity),
                transfer_rate: entry.transfer_rate.unwrap_or(base.transfer_rate),
            },
        );
    }
    Ok(table)
}

/// Resolve a file of node templates against `tiers`.
pub fn load_node_catalog(path: &Path, tiers: &TierTable) -> Result<NodeCatalog, DataLoadError> {
    let entries: Vec<NodeData> = deserialize_list(path, "nodes")?;
    let mut catalog = NodeCatalog::default();

    for node in entries {
        if catalog.contains(&node.name) {
            return Err(DataLoadError::DuplicateName {
                file: path.to_path_buf(),
                name: node.name,
            });
        }
        let spec = node.tier.map(|t| tiers.get(t));
        let capacity = match (node.capacity, spec) {
            (Some(capacity), _) => capacity,
            (None, Some(spec)) => spec.capacity,
            (None, None) => {
                return Err(DataLoadError::Invalid {
                    file: path.to_path_buf(),
                    detail: format!("node '{}' needs a tier or a capacity", node.name),
                });
            }
        };
        let rate = spec.map_or(0, |s| s.transfer_rate);
        catalog.insert(
            node.name,
            NodeTemplate {
                energy_type: node.energy_type,
                capacity,
                max_receive: node.max_receive.unwrap_or(rate),
                max_extract: node.max_extract.unwrap_or(rate),
            },
        );
    }
    Ok(catalog)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use voltgrid_core::energy::EnergyType;
    use voltgrid_core::storage::StorageTier;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "voltgrid_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // detect_format / find_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("network.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("network.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("network.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("network.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("network")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn find_data_file_missing_and_conflict() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "network").unwrap(), None);
        assert!(matches!(
            require_data_file(&dir, "network"),
            Err(DataLoadError::MissingRequired { .. })
        ));

        fs::write(dir.join("network.ron"), "()").unwrap();
        assert_eq!(
            find_data_file(&dir, "network").unwrap(),
            Some(dir.join("network.ron"))
        );

        fs::write(dir.join("network.json"), "{}").unwrap();
        assert!(matches!(
            find_data_file(&dir, "network"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // network config
    // -----------------------------------------------------------------------

    #[test]
    fn empty_directory_yields_defaults() {
        let dir = make_test_dir("empty");
        let data = load_voltgrid_data(&dir).unwrap();
        assert_eq!(data.network, NetworkConfig::default());
        assert_eq!(data.tiers, TierTable::default());
        assert!(data.nodes.is_empty());
        cleanup(&dir);
    }

    #[test]
    fn partial_ron_config_keeps_defaults() {
        let dir = make_test_dir("net_ron");
        fs::write(
            dir.join("network.ron"),
            "(transfer_rate_cap: 250, max_transport_distance: Some(16))",
        )
        .unwrap();
        let config = load_voltgrid_data(&dir).unwrap().network;
        assert_eq!(config.transfer_rate_cap, 250);
        assert_eq!(config.max_transport_distance, Some(16));
        assert_eq!(config.path_ttl, 30);
        cleanup(&dir);
    }

    #[test]
    fn toml_and_json_configs_load() {
        let dir = make_test_dir("net_toml");
        let path = dir.join("network.toml");
        fs::write(&path, "path_ttl = 60\nuse_path_caching = false\nregion_size = 32\n").unwrap();
        let config = load_network_config(&path).unwrap();
        assert_eq!(config.path_ttl, 60);
        assert!(!config.use_path_caching);
        assert_eq!(config.region_size.get(), 32);

        let path = dir.join("other.json");
        fs::write(&path, r#"{"loss_per_hop_bp": 250}"#).unwrap();
        assert_eq!(load_network_config(&path).unwrap().loss_per_hop_bp, 250);
        cleanup(&dir);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = make_test_dir("net_invalid");
        let path = dir.join("network.json");
        fs::write(&path, r#"{"max_loss_bp": 20000}"#).unwrap();
        assert!(matches!(
            load_network_config(&path),
            Err(DataLoadError::Invalid { .. })
        ));

        fs::write(&path, r#"{"region_size": 0}"#).unwrap();
        assert!(matches!(
            load_network_config(&path),
            Err(DataLoadError::Parse { .. })
        ));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // tiers and nodes
    // -----------------------------------------------------------------------

    #[test]
    fn tier_overrides_apply_on_top_of_builtins() {
        let dir = make_test_dir("tiers");
        let path = dir.join("storage_tiers.json");
        fs::write(&path, r#"[{"tier": "basic", "capacity": 20000}]"#).unwrap();
        let table = load_tier_table(&path).unwrap();
        assert_eq!(
            table.get(StorageTier::Basic),
            TierSpec {
                capacity: 20_000,
                transfer_rate: 100,
            }
        );
        assert_eq!(table.get(StorageTier::Elite).capacity, 250_000);
        cleanup(&dir);
    }

    #[test]
    fn duplicate_tier_is_rejected() {
        let dir = make_test_dir("tiers_dup");
        let path = dir.join("storage_tiers.ron");
        fs::write(&path, "[(tier: basic), (tier: basic)]").unwrap();
        assert!(matches!(
            load_tier_table(&path),
            Err(DataLoadError::DuplicateName { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn nodes_resolve_against_overridden_tiers() {
        let dir = make_test_dir("nodes");
        fs::write(
            dir.join("storage_tiers.toml"),
            "[[tiers]]\ntier = \"advanced\"\ntransfer_rate = 800\n",
        )
        .unwrap();
        fs::write(
            dir.join("nodes.toml"),
            r#"
[[nodes]]
name = "battery"
energy_type = "electrical"
tier = "advanced"

[[nodes]]
name = "boiler"
energy_type = "steam"
capacity = 4000
max_extract = 200
"#,
        )
        .unwrap();

        let data = load_voltgrid_data(&dir).unwrap();
        let battery = data.nodes.get("battery").unwrap();
        assert_eq!(battery.capacity, 50_000);
        assert_eq!(battery.max_receive, 800);
        assert_eq!(battery.max_extract, 800);

        let boiler = data.nodes.get("boiler").unwrap();
        assert_eq!(boiler.energy_type, EnergyType::Steam);
        assert_eq!(boiler.max_receive, 0);
        assert_eq!(boiler.max_extract, 200);
        cleanup(&dir);
    }

    #[test]
    fn node_without_size_is_invalid() {
        let dir = make_test_dir("nodes_invalid");
        let path = dir.join("nodes.json");
        fs::write(&path, r#"[{"name": "ghost", "energy_type": "solar"}]"#).unwrap();
        assert!(matches!(
            load_node_catalog(&path, &TierTable::default()),
            Err(DataLoadError::Invalid { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn duplicate_node_name_is_rejected() {
        let dir = make_test_dir("nodes_dup");
        let path = dir.join("nodes.json");
        fs::write(
            &path,
            r#"[{"name": "a", "energy_type": "solar", "capacity": 1},
                {"name": "a", "energy_type": "solar", "capacity": 2}]"#,
        )
        .unwrap();
        assert!(matches!(
            load_node_catalog(&path, &TierTable::default()),
            Err(DataLoadError::DuplicateName { .. })
        ));
        cleanup(&dir);
    }
}
