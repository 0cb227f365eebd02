//! 笔记时间戳状态栏
//!
//! 在状态栏显示活动笔记的创建时间与最后修改时间，
//! 支持切换文档、定时刷新、设置即时生效与点击循环显示

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::data_core::{AppError, HostBindings, StampController};
pub use model::host::{
    ActiveDocument, ConfigurableUi, DocumentSource, DocumentStat, Lifecycle, SettingsStore,
    StatusItem, TimerDriver, TimerHandle, TimestampFormatter,
};
pub use model::moment::MomentFormatter;
pub use model::settings::{SettingChange, Settings};
pub use model::slot::SlotKind;
