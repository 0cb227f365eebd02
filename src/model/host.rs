//! 宿主协作接口：文档元数据、时间格式化、状态栏元素、设置存储、定时器
//!
//! 控制器只依赖这些窄接口，由宿主（桌面窗口或测试替身）注入实现

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::model::data_core::AppError;
use crate::model::settings::Settings;

/// 文档的时间元数据（Unix 毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStat {
    pub ctime_ms: i64,
    pub mtime_ms: i64,
}

/// 当前聚焦的文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub path: PathBuf,
    pub stat: DocumentStat,
}

/// 活动文档来源；没有打开任何文档时返回 None
pub trait DocumentSource {
    fn active_document(&self) -> Option<ActiveDocument>;
}

/// 时间格式化能力：任意模式串都接受，无法识别的字符原样输出
pub trait TimestampFormatter {
    fn format(&self, instant_ms: i64, pattern: &str) -> String;
}

/// 状态栏中的一个元素
pub trait StatusItem {
    fn set_text(&mut self, text: &str);
    fn show(&mut self);
    fn hide(&mut self);
    /// 是否响应点击（点击后由宿主回调控制器）
    fn set_clickable(&mut self, clickable: bool);
}

/// 设置持久化；与默认值的合并由控制器完成
pub trait SettingsStore {
    fn load_persisted(&self) -> Result<Option<Value>, AppError>;
    fn save_persisted(&mut self, settings: &Settings) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// 周期定时器。回调目标由宿主在构造驱动时绑定
pub trait TimerDriver {
    fn schedule(&mut self, interval: Duration) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// 与宿主加载/卸载钩子对应的生命周期
pub trait Lifecycle {
    fn start(&mut self);
    fn stop(&mut self);
}

/// 设置面板：把当前设置写回到界面控件
pub trait ConfigurableUi {
    fn render_settings(&mut self, settings: &Settings);
}
