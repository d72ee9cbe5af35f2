//! Document persistence codec
//!
//! Wire shape (version 1):
//!
//! ```json
//! {"version":1,
//!  "root":{"props":{"background":{"base":"white"}}},
//!  "zones":{"root.content":[{"id":"…","type":"Section","props":{…}}]}}
//! ```
//!
//! Zones and props are written in key order, so encoding the same document
//! twice yields identical bytes. Decoding upgrades legacy responsive values,
//! keeps unknown block types as inert placeholders and recreates missing
//! slot zones; anything structurally unsound fails the whole decode.

use std::collections::BTreeMap;

use pagekit_registry::{BlockInstance, InstanceId, Registry};
use pagekit_schema::Props;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;
use crate::tree::{canonicalise_props, Document};
use crate::zone::{Zone, ZoneId};

/// Format version written by this codec
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct WireOut<'a> {
    version: u32,
    root: WireRootOut<'a>,
    zones: BTreeMap<String, &'a [BlockInstance]>,
}

#[derive(Serialize)]
struct WireRootOut<'a> {
    props: &'a Props,
}

#[derive(Deserialize)]
struct WireIn {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    root: WireRootIn,
    #[serde(default)]
    zones: BTreeMap<String, Vec<BlockInstance>>,
}

#[derive(Default, Deserialize)]
struct WireRootIn {
    #[serde(default)]
    props: Props,
}

/// Block of an unregistered type kept as a placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBlock {
    /// Instance id
    pub id: InstanceId,
    /// Unregistered type name
    pub type_name: String,
    /// Zone holding it
    pub zone: ZoneId,
}

/// What decoding had to interpret or repair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Format version of the input
    pub version: u32,
    /// Input carried no version field
    pub unversioned: bool,
    /// Responsive values upgraded to the keyed form
    pub upgraded_values: usize,
    /// Placeholders for unregistered block types
    pub unknown_blocks: Vec<UnknownBlock>,
    /// Slot zones that were missing and created empty
    pub repaired_zones: Vec<ZoneId>,
}

impl DecodeReport {
    /// True when the input was already canonical and complete
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.unversioned
            && self.upgraded_values == 0
            && self.unknown_blocks.is_empty()
            && self.repaired_zones.is_empty()
    }
}

/// Decoded document with its report
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// The document
    pub document: Document,
    /// What decoding changed or could not interpret
    pub report: DecodeReport,
}

fn wire(document: &Document) -> WireOut<'_> {
    WireOut {
        version: FORMAT_VERSION,
        root: WireRootOut {
            props: document.root_props(),
        },
        zones: document
            .zones()
            .map(|zone| (zone.id().to_string(), zone.items()))
            .collect(),
    }
}

/// Encode a document as a JSON value
///
/// # Errors
/// Returns `CodecError::Json` if a prop cannot be represented.
pub fn serialize(document: &Document) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(wire(document))?)
}

/// Encode a document as compact JSON text
///
/// # Errors
/// Returns `CodecError::Json` if a prop cannot be represented.
pub fn to_string(document: &Document) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&wire(document))?)
}

/// Encode a document as indented JSON text
///
/// # Errors
/// Returns `CodecError::Json` if a prop cannot be represented.
pub fn to_string_pretty(document: &Document) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&wire(document))?)
}

/// Decode JSON text
///
/// # Errors
/// See [`deserialize_value`].
pub fn deserialize(json: &str, registry: &Registry) -> Result<Decoded, CodecError> {
    let raw: WireIn = serde_json::from_str(json)?;
    decode(raw, registry)
}

/// Decode a JSON value
///
/// # Errors
/// - `CodecError::Json` if the value is not a document
/// - `CodecError::UnsupportedVersion` for versions other than 1
/// - `CodecError::InvalidZoneId` for malformed zone keys
/// - `CodecError::DuplicateZone` when two keys spell the same zone
/// - `CodecError::Corrupt` for duplicate ids, orphan zones or cycles
pub fn deserialize_value(json: Value, registry: &Registry) -> Result<Decoded, CodecError> {
    let raw: WireIn = serde_json::from_value(json)?;
    decode(raw, registry)
}

fn decode(raw: WireIn, registry: &Registry) -> Result<Decoded, CodecError> {
    let mut report = DecodeReport {
        version: raw.version.unwrap_or(FORMAT_VERSION),
        unversioned: raw.version.is_none(),
        ..DecodeReport::default()
    };
    if report.version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(report.version));
    }

    let mut root_props = raw.root.props;
    report.upgraded_values += canonicalise_props(registry.root(), &mut root_props);

    let mut zones = BTreeMap::new();
    for (key, mut items) in raw.zones {
        let zone_id: ZoneId = key.parse()?;
        for item in &mut items {
            match registry.lookup(item.type_name()) {
                Some(definition) => {
                    report.upgraded_values += canonicalise_props(definition, item.props_mut());
                }
                None => {
                    tracing::warn!(
                        instance = %item.id(),
                        block_type = item.type_name(),
                        zone = %zone_id,
                        "unknown block type kept as placeholder"
                    );
                    report.unknown_blocks.push(UnknownBlock {
                        id: item.id(),
                        type_name: item.type_name().to_string(),
                        zone: zone_id.clone(),
                    });
                }
            }
        }
        if zones.contains_key(&zone_id) {
            tracing::warn!(zone = %zone_id, key = %key, "zone listed twice");
            return Err(CodecError::DuplicateZone(zone_id));
        }
        zones.insert(zone_id.clone(), Zone::with_items(zone_id, items));
    }

    repair_missing_zones(&mut zones, registry, &mut report);
    if report.upgraded_values > 0 {
        tracing::debug!(count = report.upgraded_values, "upgraded legacy responsive values");
    }

    let document = Document::from_parts(root_props, zones);
    document.validate(registry)?;
    Ok(Decoded { document, report })
}

fn repair_missing_zones(
    zones: &mut BTreeMap<ZoneId, Zone>,
    registry: &Registry,
    report: &mut DecodeReport,
) {
    let mut wanted: Vec<ZoneId> = registry
        .root()
        .slots()
        .iter()
        .map(|slot| ZoneId::root(slot.as_str()))
        .collect();
    for zone in zones.values() {
        for item in zone.items() {
            if let Some(definition) = registry.lookup(item.type_name()) {
                wanted.extend(
                    definition
                        .slots()
                        .iter()
                        .map(|slot| ZoneId::of(item.id(), slot.as_str())),
                );
            }
        }
    }
    for zone_id in wanted {
        if !zones.contains_key(&zone_id) {
            tracing::debug!(zone = %zone_id, "recreated missing zone");
            zones.insert(zone_id.clone(), Zone::new(zone_id.clone()));
            report.repaired_zones.push(zone_id);
        }
    }
}

/// Decode then re-encode, producing the canonical current form
///
/// # Errors
/// As [`deserialize`].
pub fn migrate(json: &str, registry: &Registry) -> Result<(String, DecodeReport), CodecError> {
    let decoded = deserialize(json, registry)?;
    Ok((to_string_pretty(&decoded.document)?, decoded.report))
}
