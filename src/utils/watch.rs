//! 活动笔记的文件监听：内容写入或被替换时通知宿主

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::model::data_core::AppError;

/// 监听单个笔记。丢弃时自动停止监听
pub struct NoteWatcher {
    note: PathBuf,
    _watcher: RecommendedWatcher,
}

impl NoteWatcher {
    /// 监听笔记所在目录（非递归），编辑器以重命名方式保存时也能收到事件
    ///
    /// `on_modified` 在 notify 的后台线程中调用
    pub fn watch<F>(note: &Path, on_modified: F) -> Result<Self, AppError>
    where
        F: Fn(PathBuf) + Send + 'static,
    {
        let dir = note
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let target = note.to_path_buf();
        let watched = target.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if touches_note(&event, &watched) => on_modified(watched.clone()),
                Ok(_) => {}
                Err(e) => tracing::warn!("文件监听错误: {}", e),
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::info!("开始监听笔记: {}", target.display());

        Ok(Self {
            note: target,
            _watcher: watcher,
        })
    }

    pub fn note(&self) -> &Path {
        &self.note
    }
}

/// 事件是否表示该笔记的内容发生了变化
pub fn touches_note(event: &Event, note: &Path) -> bool {
    let is_write = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    is_write && event.paths.iter().any(|p| p == note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
    use tempfile::tempdir;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_content_write_touches_note() {
        let e = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/notes/a.md",
        );
        assert!(touches_note(&e, Path::new("/notes/a.md")));
        assert!(!touches_note(&e, Path::new("/notes/b.md")));
    }

    #[test]
    fn test_replace_by_create_touches_note() {
        let e = event(EventKind::Create(CreateKind::File), "/notes/a.md");
        assert!(touches_note(&e, Path::new("/notes/a.md")));
    }

    #[test]
    fn test_remove_and_access_are_ignored() {
        let removed = event(EventKind::Remove(RemoveKind::File), "/notes/a.md");
        assert!(!touches_note(&removed, Path::new("/notes/a.md")));

        let access = event(EventKind::Access(notify::event::AccessKind::Any), "/notes/a.md");
        assert!(!touches_note(&access, Path::new("/notes/a.md")));
    }

    #[test]
    fn test_watch_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let note = dir.path().join("gone").join("a.md");
        let result = NoteWatcher::watch(&note, |_| {});
        assert!(result.is_err());
    }

    #[test]
    fn test_watch_existing_note() {
        let dir = tempdir().unwrap();
        let note = dir.path().join("a.md");
        std::fs::write(&note, "# 笔记").unwrap();
        let watcher = NoteWatcher::watch(&note, |_| {}).unwrap();
        assert_eq!(watcher.note(), note.as_path());
    }
}
