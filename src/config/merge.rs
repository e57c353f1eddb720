//! Field-by-field merging of configuration tiers.
//!
//! Higher tiers override lower tiers one leaf at a time, so a user file that only
//! sets `destination.api_token` keeps the project's `destination.url`.
//! Lists (e.g. `excluded_columns`) are replaced whole.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge recursively. A `null` in the overlay means "not specified" and keeps the
/// base value. Anything else in the overlay wins.
///
/// ```
/// use serde_json::json;
/// use kanboard_migrate::config::deep_merge;
///
/// let project = json!({ "source": { "url": "https://todo.example.org/jsonrpc.php", "project_id": "45" } });
/// let user = json!({ "source": { "project_id": "87" } });
/// let merged = deep_merge(project, user);
/// assert_eq!(merged["source"]["url"], "https://todo.example.org/jsonrpc.php");
/// assert_eq!(merged["source"]["project_id"], "87");
/// ```
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Merge tiers in priority order, lowest first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

/// Overlay in place. Keys already in `slot` keep their position.
fn merge_into(slot: &mut Value, overlay: Value) {
    match (slot, overlay) {
        (_, Value::Null) => {}
        (Value::Object(fields), Value::Object(overlay_fields)) => {
            for (key, value) in overlay_fields {
                match fields.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        fields.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_tier_overrides_single_leaf() {
        let defaults = json!({
            "source": {"url": "", "user": "jsonrpc", "token": ""},
            "migration": {"unmatched": "fail"}
        });
        let project = json!({
            "source": {"url": "https://todo.example.org/jsonrpc.php"}
        });
        let user = json!({
            "source": {"token": "secret"},
            "migration": {"unmatched": "skip"}
        });

        let merged = deep_merge_all(vec![defaults, project, user]);
        assert_eq!(
            merged,
            json!({
                "source": {
                    "url": "https://todo.example.org/jsonrpc.php",
                    "user": "jsonrpc",
                    "token": "secret"
                },
                "migration": {"unmatched": "skip"}
            })
        );
    }

    #[test]
    fn test_excluded_columns_replaced_not_concatenated() {
        let base = json!({"source": {"excluded_columns": ["370", "371"]}});
        let overlay = json!({"source": {"excluded_columns": ["184"]}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"source": {"excluded_columns": ["184"]}})
        );
    }

    #[test]
    fn test_null_keeps_lower_tier() {
        let base = json!({"destination": {"watcher_phid": "PHID-USER-1"}});
        let overlay = json!({"destination": {"watcher_phid": null}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"destination": {"watcher_phid": "PHID-USER-1"}})
        );
    }

    #[test]
    fn test_overridden_keys_keep_their_position() {
        let base = json!({"url": "a", "user": "jsonrpc", "token": ""});
        let overlay = json!({"url": "b", "project_id": "45"});
        let merged = deep_merge(base, overlay);
        let keys: Vec<&str> = merged.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["url", "user", "token", "project_id"]);
        assert_eq!(merged["url"], "b");
    }

    #[test]
    fn test_scalar_and_object_replace_each_other() {
        assert_eq!(
            deep_merge(json!({"migration": 1}), json!({"migration": {"unmatched": "skip"}})),
            json!({"migration": {"unmatched": "skip"}})
        );
        assert_eq!(
            deep_merge(json!({"migration": {"unmatched": "skip"}}), json!({"migration": 1})),
            json!({"migration": 1})
        );
    }
}
