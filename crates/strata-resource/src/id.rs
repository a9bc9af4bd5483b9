use crate::error::{ResourceError, ResourceResult};

/// File extension of every resource.
pub const RESOURCE_EXTENSION: &str = "md";

/// Check that `id` names a single file inside a resource directory.
///
/// Rejects the empty id, NUL, either path separator, and a `..` segment.
/// Dots inside a name (`v1..2`) are fine. This is checked independently of
/// the allow-list check done on full paths.
pub fn validate_resource_id(id: &str) -> ResourceResult<()> {
    // Without separators the id is a single segment.
    let invalid = id.is_empty() || id.contains(['/', '\\', '\0']) || id == "..";
    if invalid {
        return Err(ResourceError::InvalidResourceId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_ids() {
        for id in ["reviewer", "code-review", "v1.2", "v1..2", "...", ".hidden", "with space"] {
            assert!(validate_resource_id(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn rejects_escapes() {
        for id in ["", "..", "../escape", "a/..", "..\\b", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(validate_resource_id(id), Err(ResourceError::InvalidResourceId(_))),
                "{id:?}"
            );
        }
    }
}
