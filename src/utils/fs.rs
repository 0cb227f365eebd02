//! IO helper: JSON 设置文件读写、活动笔记的文件元数据

use std::{
    cell::RefCell,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use serde_json::Value;

use crate::model::data_core::AppError;
use crate::model::host::{ActiveDocument, DocumentSource, DocumentStat, SettingsStore};
use crate::model::settings::Settings;

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, AppError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: Value = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 将JSON数据保存到文件（格式化输出，先写临时文件再重命名）
pub fn write_json_file(p: &Path, value: &Value) -> Result<(), AppError> {
    if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file_name = p
        .file_name()
        .ok_or_else(|| AppError::State(format!("无效的文件路径: {}", p.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(format!(".tmp.{}", std::process::id()));
    let temp = p.with_file_name(temp_name);

    let result = write_then_rename(&temp, p, value);
    if result.is_err() {
        // 失败时清理临时文件
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_then_rename(temp: &Path, target: &Path, value: &Value) -> Result<(), AppError> {
    let f = File::create(temp)?;
    serde_json::to_writer_pretty(f, value)?;
    fs::rename(temp, target)?;
    Ok(())
}

/// 基于 JSON 文件的设置存储（对应插件的 data.json）
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load_persisted(&self) -> Result<Option<Value>, AppError> {
        if !self.path.exists() {
            tracing::info!("设置文件不存在，使用默认设置: {}", self.path.display());
            return Ok(None);
        }
        read_json_file(&self.path).map(Some)
    }

    fn save_persisted(&mut self, settings: &Settings) -> Result<(), AppError> {
        let value = serde_json::to_value(settings)?;
        write_json_file(&self.path, &value)?;
        tracing::debug!("设置已保存: {}", self.path.display());
        Ok(())
    }
}

/// 读取文件的创建与修改时间；平台不提供创建时间时退回修改时间
pub fn read_document_stat(p: &Path) -> Result<DocumentStat, AppError> {
    let meta = fs::metadata(p)?;
    let modified = meta.modified()?;
    let created = meta.created().unwrap_or_else(|e| {
        tracing::debug!("无法获取创建时间，改用修改时间: {}", e);
        modified
    });
    Ok(DocumentStat {
        ctime_ms: epoch_millis(created),
        mtime_ms: epoch_millis(modified),
    })
}

fn epoch_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

/// 当前打开的笔记路径；克隆后共享同一状态，宿主切换文档时更新
#[derive(Debug, Clone, Default)]
pub struct ActiveFile(Rc<RefCell<Option<PathBuf>>>);

impl ActiveFile {
    pub fn set(&self, path: Option<PathBuf>) {
        *self.0.borrow_mut() = path;
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.0.borrow().clone()
    }
}

impl DocumentSource for ActiveFile {
    fn active_document(&self) -> Option<ActiveDocument> {
        let path = self.path()?;
        match read_document_stat(&path) {
            Ok(stat) => Some(ActiveDocument { path, stat }),
            Err(e) => {
                // 定时轮询会反复走到这里，只记 debug
                tracing::debug!("读取笔记元数据失败 {}: {}", path.display(), e);
                None
            }
        }
    }
}
