//! VM桥接层：连接Slint UI与StampController
//!
//! 注意：依赖Slint生成类型的适配器在main.rs中实现
//! 这里提供界面常量以及设置面板输入到 SettingChange 的转换

use crate::model::data_core::AppError;
use crate::model::settings::{parse_refresh_interval, SettingChange, Settings};
use crate::model::slot::SlotKind;

// === 常量定义（消除魔法值） ===
pub const STATUS_NO_DOCUMENT: &str = "未打开笔记";
pub const STATUS_DOCUMENT_OPENED: &str = "已打开笔记";
pub const STATUS_DOCUMENT_CLOSED: &str = "笔记已关闭";
pub const STATUS_SETTINGS_SAVED: &str = "设置已更新";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

pub const DATA_FILE_ENV: &str = "SHIJIANCHUO_DATA";
pub const DEFAULT_DATA_FILE: &str = "data.json";

// === 设置面板控件的键名（与 app_window.slint 一致） ===
pub const KEY_LAST_MODIFIED_ENABLED: &str = "last-modified-enabled";
pub const KEY_LAST_MODIFIED_FORMAT: &str = "last-modified-format";
pub const KEY_LAST_MODIFIED_PREPEND: &str = "last-modified-prepend";
pub const KEY_CREATED_ENABLED: &str = "created-enabled";
pub const KEY_CREATED_FORMAT: &str = "created-format";
pub const KEY_CREATED_PREPEND: &str = "created-prepend";
pub const KEY_CYCLE_ON_CLICK: &str = "cycle-on-click";
pub const KEY_REFRESH_INTERVAL: &str = "refresh-interval";

/// 复选框切换
pub fn setting_change_from_toggle(key: &str, checked: bool) -> Result<SettingChange, AppError> {
    match key {
        KEY_LAST_MODIFIED_ENABLED => Ok(SettingChange::Enabled(SlotKind::LastModified, checked)),
        KEY_CREATED_ENABLED => Ok(SettingChange::Enabled(SlotKind::Created, checked)),
        KEY_CYCLE_ON_CLICK => Ok(SettingChange::CycleOnClick(checked)),
        other => Err(AppError::UnknownSetting(other.to_string())),
    }
}

/// 文本框编辑；格式串与前缀不做校验
pub fn setting_change_from_edit(key: &str, value: &str) -> Result<SettingChange, AppError> {
    match key {
        KEY_LAST_MODIFIED_FORMAT => Ok(SettingChange::TimestampFormat(
            SlotKind::LastModified,
            value.to_string(),
        )),
        KEY_LAST_MODIFIED_PREPEND => Ok(SettingChange::Prepend(
            SlotKind::LastModified,
            value.to_string(),
        )),
        KEY_CREATED_FORMAT => Ok(SettingChange::TimestampFormat(
            SlotKind::Created,
            value.to_string(),
        )),
        KEY_CREATED_PREPEND => Ok(SettingChange::Prepend(SlotKind::Created, value.to_string())),
        KEY_REFRESH_INTERVAL => parse_refresh_interval(value).map(SettingChange::RefreshInterval),
        other => Err(AppError::UnknownSetting(other.to_string())),
    }
}

/// 面板中显示实际生效（已限幅）的刷新间隔
pub fn refresh_interval_text(settings: &Settings) -> String {
    format_interval_secs(settings.refresh_interval().as_secs_f64())
}

/// 刷新间隔在面板中的显示文本（秒）
pub fn format_interval_secs(secs: f64) -> String {
    let mut text = format!("{:.3}", secs);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}
