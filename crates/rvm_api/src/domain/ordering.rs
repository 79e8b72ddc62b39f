use common::domain::Device;
use std::cmp::Ordering;

/// Total order over devices: most recently used first, never-used devices
/// after every used one, ties broken by ascending id
///
/// Nulls-last is fixed here rather than left to whatever the store's
/// `ORDER BY ... DESC` does with nulls, which differs between databases.
pub fn compare_devices(a: &Device, b: &Device) -> Ordering {
    let by_usage = match (a.last_usage, b.last_usage) {
        (Some(a_used), Some(b_used)) => b_used.cmp(&a_used),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_usage.then_with(|| a.id.cmp(&b.id))
}

pub fn sort_devices(devices: &mut [Device]) {
    devices.sort_by(compare_devices);
}
