use serde_json::Value;

/// Resolve a dotted path (`a.b.c`) into a nested data bag.
///
/// Missing intermediate keys and non-object intermediates resolve to
/// `None` ("not exists"); a lookup never panics.
pub fn lookup<'a>(data: &'a Value, field: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in field.split('.') {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }
    Some(current)
}
