use uuid::Uuid;

/// Fixed namespace for deriving vector-store point ids. The namespace value
/// itself carries no meaning beyond being stable across process restarts —
/// mirrors the original's `uuid5(NAMESPACE_DNS, f"{id}_{index}")` scheme,
/// swapping in a Jarvis-local namespace since `NAMESPACE_DNS` was an
/// arbitrary choice there too.
pub const POINT_NAMESPACE: Uuid = Uuid::from_bytes([
    0x4a, 0x61, 0x72, 0x76, 0x69, 0x73, 0x2d, 0x70, 0x6f, 0x69, 0x6e, 0x74, 0x2d, 0x6e, 0x73, 0x00,
]);

/// Derive a stable point id for the nth chunk/capture-text of `source_id`.
///
/// Re-indexing the same source produces the same point id for the same
/// chunk index, satisfying the idempotent-ingest invariant in §3/§8.
pub fn point_id(source_id: &Uuid, chunk_index: i32) -> Uuid {
    let name = format!("{source_id}_{chunk_index}");
    Uuid::new_v5(&POINT_NAMESPACE, name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_stable_across_calls() {
        let id = Uuid::new_v4();
        assert_eq!(point_id(&id, 0), point_id(&id, 0));
    }

    #[test]
    fn point_id_differs_by_chunk_index() {
        let id = Uuid::new_v4();
        assert_ne!(point_id(&id, 0), point_id(&id, 1));
    }

    #[test]
    fn point_id_differs_by_source() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(point_id(&a, 0), point_id(&b, 0));
    }
}
