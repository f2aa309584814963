/// Marker appended to the name of every alarm definition this controller owns.
pub const MANAGED_SUFFIX: &str = " - adc";

pub fn is_managed(name: &str) -> bool {
    name.ends_with(MANAGED_SUFFIX)
}

pub fn managed_name(name: &str) -> String {
    if is_managed(name) {
        name.to_string()
    } else {
        format!("{name}{MANAGED_SUFFIX}")
    }
}
