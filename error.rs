use thiserror::Error;

/// Errors surfaced by the store.
///
/// Absence of a key is never an error: it is represented by `Option::None`
/// from the typed getters (or, for `representation`, by a defaulted zero
/// weight). A block whose bytes fail to decode is likewise folded into
/// `None` by `block_get`/`unchecked_get` rather than raised here, since the
/// caller cannot distinguish "absent" from "unreadable" and must not try to.
/// This enum covers only failures the caller must react to: the store could
/// not be opened, or the underlying engine faulted.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened at the given path: the directory is
    /// missing, permissions are insufficient, or another live handle
    /// already holds a lock on the tables there. All three collapse into
    /// one non-ok construction status; the caller cannot usefully tell
    /// them apart and gets an unusable store either way.
    #[error("failed to open store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// The underlying engine faulted during a read or write. The engine
    /// owns durability and retry; a fault here is not retried.
    #[error("engine error: {0}")]
    Engine(#[from] libmdbx::Error),
}
