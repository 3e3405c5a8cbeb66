//! Classification of raw `notify` events.

use std::path::PathBuf;

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// Paths that became new files through this event.
///
/// Creations count, and so do renames into the watched directory. Backends
/// that cannot tell the rename side apart report `RenameMode::Any`; callers
/// check that the path still exists. Paired renames are skipped because the
/// destination was already reported by its own `RenameMode::To` event.
pub fn created_paths(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(CreateKind::File | CreateKind::Any | CreateKind::Other)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => {
            event.paths.clone()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn file_creation_is_reported() {
        let e = event(EventKind::Create(CreateKind::File), &["/in/a.png"]);
        assert_eq!(created_paths(&e), vec![PathBuf::from("/in/a.png")]);
    }

    #[test]
    fn folder_creation_is_ignored() {
        let e = event(EventKind::Create(CreateKind::Folder), &["/in/sub"]);
        assert!(created_paths(&e).is_empty());
    }

    #[test]
    fn rename_into_directory_counts_as_creation() {
        let e = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/in/b.png"],
        );
        assert_eq!(created_paths(&e), vec![PathBuf::from("/in/b.png")]);
    }

    #[test]
    fn paired_rename_is_not_reported_twice() {
        let e = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/in/b.tmp", "/in/b.png"],
        );
        assert!(created_paths(&e).is_empty());
    }

    #[test]
    fn ambiguous_rename_is_reported() {
        let e = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            &["/in/d.png"],
        );
        assert_eq!(created_paths(&e), vec![PathBuf::from("/in/d.png")]);
    }

    #[test]
    fn other_events_are_ignored() {
        for kind in [
            EventKind::Remove(RemoveKind::File),
            EventKind::Access(AccessKind::Any),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            EventKind::Modify(ModifyKind::Any),
        ] {
            assert!(created_paths(&event(kind, &["/in/c.png"])).is_empty());
        }
    }
}
