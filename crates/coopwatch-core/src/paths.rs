//! Logical paths of the real-time store.
//!
//! Paths are slash-separated segment strings addressing nodes in the store
//! tree. The four top-level collections mirror the store layout documented
//! for the farm: two single-record paths and two keyed collections.

/// Current environmental reading (single record).
pub const SENSOR_DATA: &str = "sensorData";

/// Current gas concentration reading (single record).
pub const GAS_DATA: &str = "gasData";

/// Equipment units, keyed by unit id.
pub const EQUIPMENT: &str = "equipment";

/// Alert events, keyed by alert id.
pub const ALERTS: &str = "alerts";

/// Path of one equipment unit record.
pub fn equipment_unit(id: &str) -> String {
    format!("{EQUIPMENT}/{id}")
}

/// Path of a single field inside an equipment unit record.
pub fn equipment_field(id: &str, field: &str) -> String {
    format!("{EQUIPMENT}/{id}/{field}")
}

/// Path of one alert record.
pub fn alert(id: &str) -> String {
    format!("{ALERTS}/{id}")
}

/// Whether two paths address overlapping subtrees.
///
/// A write at `a` is visible to a subscriber at `b` when one path is a
/// segment-wise prefix of the other: writes below a subscription change its
/// snapshot, and writes above it replace the whole subtree it watches.
pub(crate) fn overlaps(a: &str, b: &str) -> bool {
    let mut left = a.split('/');
    let mut right = b.split('/');
    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) if l == r => continue,
            (Some(_), Some(_)) => return false,
            // One path ran out: it is a prefix of the other.
            _ => return true,
        }
    }
}
