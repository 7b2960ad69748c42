//! Static vendor lookup tables: part-type taxonomies and parametric value ids.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::types::MountingType;

/// DigiKey parametric parameter ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ParameterId {
    Power = 2,
    Tolerance = 3,
    VoltageRating = 14,
    MountingType = 69,
    Capacitance = 2049,
    Resistance = 2085,
    Inductance = 2087,
    CurrentRating = 2088,
}

impl ParameterId {
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Matching TME parameter id; TME filters on the value text.
    pub fn tme_id(self) -> u32 {
        match self {
            ParameterId::Power => 33,
            ParameterId::Tolerance => 35,
            ParameterId::VoltageRating => 122,
            ParameterId::MountingType => 2,
            ParameterId::Capacitance => 120,
            ParameterId::Resistance => 38,
            ParameterId::Inductance => 111,
            ParameterId::CurrentRating => 10,
        }
    }
}

/// DigiKey category ids for resistor families. These categories expose no
/// mounting-type parameter, so a mounting filter would empty the result set.
const RESISTOR_TAXONOMIES: &[u32] = &[2, 52, 53, 54, 55];

static PART_TYPE_TAXONOMIES: LazyLock<HashMap<&'static str, &'static [u32]>> =
    LazyLock::new(|| {
        HashMap::from([
            ("resistor", &[52u32, 53] as &[u32]),
            ("resistor network", &[54u32] as &[u32]),
            ("capacitor", &[58u32, 59, 60, 61] as &[u32]),
            ("inductor", &[71u32] as &[u32]),
            ("diode", &[280u32] as &[u32]),
            ("led", &[105u32] as &[u32]),
            ("transistor", &[276u32, 278] as &[u32]),
            ("crystal", &[171u32] as &[u32]),
            ("connector", &[20u32] as &[u32]),
            ("fuse", &[139u32] as &[u32]),
        ])
    });

static TOLERANCE_VALUES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("0.01%", "1131"),
        ("0.05%", "1135"),
        ("0.1%", "1136"),
        ("0.25%", "1137"),
        ("0.5%", "1138"),
        ("1%", "1130"),
        ("2%", "1140"),
        ("5%", "1142"),
        ("10%", "1133"),
        ("20%", "1134"),
    ])
});

static POWER_VALUES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("1/20", "2356"),
        ("1/16", "2353"),
        ("1/10", "2342"),
        ("1/8", "2350"),
        ("1/5", "2347"),
        ("1/4", "2348"),
        ("1/3", "2349"),
        ("1/2", "2345"),
        ("3/4", "2364"),
        ("1", "2340"),
        ("2", "2358"),
        ("3", "2360"),
        ("5", "2362"),
        ("10", "2341"),
    ])
});

/// Category ids for a free-text part type; unknown types map to no taxonomy.
pub fn taxonomies_for(part_type: Option<&str>) -> Vec<u32> {
    part_type
        .map(|t| t.trim().to_ascii_lowercase())
        .and_then(|t| {
            PART_TYPE_TAXONOMIES
                .get(t.as_str())
                .or_else(|| PART_TYPE_TAXONOMIES.get(t.trim_end_matches('s')))
                .map(|ids| ids.to_vec())
        })
        .unwrap_or_default()
}

pub fn is_resistor_family(taxonomy: u32) -> bool {
    RESISTOR_TAXONOMIES.contains(&taxonomy)
}

pub fn tolerance_value(description: &str) -> Option<&'static str> {
    TOLERANCE_VALUES.get(description).copied()
}

pub fn power_value(description: &str) -> Option<&'static str> {
    POWER_VALUES.get(description).copied()
}

pub fn mounting_value(mounting_type: MountingType) -> Option<&'static str> {
    match mounting_type {
        MountingType::None => None,
        MountingType::ThroughHole => Some("80"),
        MountingType::SurfaceMount => Some("3"),
    }
}
