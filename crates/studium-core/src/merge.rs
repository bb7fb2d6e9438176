//! Content merge engine: reconciles a local snapshot against a remote delta.
//!
//! Merge policy is additive last-writer-wins with the remote authoritative:
//! for each entity array, remote entities overwrite local entities sharing
//! the same `id`, entities present only locally are preserved, and entities
//! present only remotely are appended. Deletions do not propagate: the
//! remote delta carries no tombstones, so the merge cannot observe them.
//!
//! The merge is pure: the output timestamp is the injected `now_ms`, not the
//! server's, and the same inputs always produce the same output.

use std::collections::HashMap;

use crate::models::{Entity, SyncableContent};

/// Merge a remote content delta into the local snapshot.
///
/// With no local snapshot (first sync) the remote entity sets are taken
/// verbatim. `now_ms` becomes the output's `last_sync_timestamp` in every
/// case.
pub fn merge(local: Option<&SyncableContent>, remote: SyncableContent, now_ms: i64) -> SyncableContent {
    let merged = match local {
        None => remote,
        Some(local) => SyncableContent {
            topics: merge_entities(&local.topics, remote.topics),
            explanations: merge_entities(&local.explanations, remote.explanations),
            progress: merge_entities(&local.progress, remote.progress),
            quizzes: merge_entities(&local.quizzes, remote.quizzes),
            last_sync_timestamp: 0,
        },
    };

    SyncableContent {
        last_sync_timestamp: now_ms,
        ..merged
    }
}

/// Merge one entity array: local order is kept, remote wins on collision,
/// remote-only entities are appended in remote order. Output never holds two
/// entities with the same `id`.
fn merge_entities(local: &[Entity], remote: Vec<Entity>) -> Vec<Entity> {
    let mut merged: Vec<Entity> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(local.len() + remote.len());

    for entity in local {
        // Duplicate local ids collapse to the last occurrence.
        match index.get(&entity.id) {
            Some(&pos) => merged[pos] = entity.clone(),
            None => {
                index.insert(entity.id.clone(), merged.len());
                merged.push(entity.clone());
            }
        }
    }

    for entity in remote {
        match index.get(&entity.id) {
            Some(&pos) => merged[pos] = entity,
            None => {
                index.insert(entity.id.clone(), merged.len());
                merged.push(entity);
            }
        }
    }

    merged
}
