use crate::ConfigType;

/// Prefix of cached configuration entries.
pub const CONFIG_KEY_PREFIX: &str = "seqcode:config:";

/// Prefix of counter entries.
pub const VALUE_KEY_PREFIX: &str = "seqcode:value:";

/// `seqcode:config:{entity}:{type}:{tenant}`
pub fn config_key(entity: &str, config_type: ConfigType, tenant: &str) -> String {
    format!("{CONFIG_KEY_PREFIX}{entity}:{config_type}:{tenant}")
}

/// `seqcode:value:{entity}:{type}:{tenant}:{isolation}:{bucket}`
pub fn counter_key(
    entity: &str,
    config_type: ConfigType,
    tenant: &str,
    isolation: &str,
    bucket: &str,
) -> String {
    format!("{VALUE_KEY_PREFIX}{entity}:{config_type}:{tenant}:{isolation}:{bucket}")
}

/// Glob over every counter of one configuration, across partitions and
/// buckets.
pub fn counter_pattern(entity: &str, config_type: ConfigType, tenant: &str) -> String {
    format!("{VALUE_KEY_PREFIX}{entity}:{config_type}:{tenant}:*")
}

/// Glob over every cached configuration.
pub fn config_pattern() -> String {
    format!("{CONFIG_KEY_PREFIX}*")
}

/// Matches `text` against a glob where `*` is the only wildcard.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(head) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((tail, middle)) = parts.split_last() else {
        // No `*` at all: exact match.
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(tail)
}
