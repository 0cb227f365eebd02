//! StampController：时间戳显示的核心状态与事件处理

use std::path::Path;

use thiserror::Error;

use crate::model::host::{
    DocumentSource, Lifecycle, SettingsStore, StatusItem, TimerDriver, TimerHandle,
    TimestampFormatter,
};
use crate::model::settings::{SettingChange, Settings};
use crate::model::slot::{self, Refreshed, Slot, SlotKind};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("文件监听失败: {0}")]
    Watch(#[from] notify::Error),
    #[error("刷新间隔无效: {0}")]
    InvalidInterval(String),
    #[error("未知设置项: {0}")]
    UnknownSetting(String),
    #[error("状态错误: {0}")]
    State(String),
}

/// 宿主注入的全部协作者
pub struct HostBindings {
    pub documents: Box<dyn DocumentSource>,
    pub formatter: Box<dyn TimestampFormatter>,
    pub last_modified_item: Box<dyn StatusItem>,
    pub created_item: Box<dyn StatusItem>,
    pub store: Box<dyn SettingsStore>,
    pub timer: Box<dyn TimerDriver>,
}

pub struct StampController {
    settings: Settings,
    /// 按 SlotKind::index 排列
    slots: [Slot; 2],
    items: [Box<dyn StatusItem>; 2],
    documents: Box<dyn DocumentSource>,
    formatter: Box<dyn TimestampFormatter>,
    store: Box<dyn SettingsStore>,
    timer: Box<dyn TimerDriver>,
    timer_handle: Option<TimerHandle>,
}

impl StampController {
    /// 读取持久化设置并与默认值合并
    pub fn load(host: HostBindings) -> Self {
        let persisted = match host.store.load_persisted() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("读取设置失败，使用默认设置: {}", e);
                None
            }
        };
        let settings = Settings::merge_with_defaults(persisted.as_ref());
        tracing::info!("设置已加载: {:?}", settings);
        Self::with_settings(settings, host)
    }

    pub fn with_settings(settings: Settings, host: HostBindings) -> Self {
        let slots = [
            Slot::from_settings(SlotKind::LastModified, &settings),
            Slot::from_settings(SlotKind::Created, &settings),
        ];
        Self {
            settings,
            slots,
            items: [host.last_modified_item, host.created_item],
            documents: host.documents,
            formatter: host.formatter,
            store: host.store,
            timer: host.timer,
            timer_handle: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn slot(&self, kind: SlotKind) -> &Slot {
        &self.slots[kind.index()]
    }

    pub fn is_running(&self) -> bool {
        self.timer_handle.is_some()
    }

    /// 重新读取活动文档并格式化该槽位
    pub fn refresh(&mut self, kind: SlotKind) -> Refreshed {
        let stat = self.documents.active_document().map(|doc| doc.stat);
        slot::refresh(&mut self.slots[kind.index()], stat.as_ref(), self.formatter.as_ref())
    }

    pub fn render(&mut self, kind: SlotKind) {
        let idx = kind.index();
        slot::render(
            &self.slots[idx],
            self.items[idx].as_mut(),
            self.settings.cycle_on_click_enabled,
        );
    }

    fn refresh_and_render(&mut self, kind: SlotKind) {
        self.refresh(kind);
        self.render(kind);
    }

    /// 用户切换了文档
    pub fn on_active_document_changed(&mut self) {
        if self.documents.active_document().is_none() {
            // 保留上一次的显示内容，不重新渲染
            tracing::debug!("活动文档为空，保留现有时间戳");
            return;
        }
        for kind in SlotKind::ALL {
            if self.settings.enabled(kind) {
                self.refresh_and_render(kind);
            }
        }
    }

    /// 某个文件被修改；只有活动文档才影响最后修改时间
    pub fn on_document_modified(&mut self, path: &Path) {
        if !self.settings.last_modified_enabled {
            return;
        }
        let is_active = self
            .documents
            .active_document()
            .is_some_and(|doc| doc.path == path);
        if is_active {
            self.refresh_and_render(SlotKind::LastModified);
        }
    }

    /// 定时轮询：仅在时间戳变化时重新渲染
    pub fn on_timer_tick(&mut self) {
        for kind in SlotKind::ALL {
            if self.settings.enabled(kind) && self.refresh(kind).changed {
                tracing::debug!("{:?} 时间戳已变化", kind);
                self.render(kind);
            }
        }
    }

    /// 应用设置修改：持久化后刷新受影响的槽位
    pub fn on_settings_changed(&mut self, change: SettingChange) {
        tracing::info!("设置修改: {:?}", change);
        self.settings.apply(&change);
        self.persist();
        self.sync_slots();

        if let SettingChange::RefreshInterval(_) = change {
            if self.is_running() {
                self.restart_timer();
            }
            return;
        }
        for kind in change.affected_slots() {
            self.refresh_and_render(kind);
        }
    }

    /// 状态栏元素被点击
    pub fn on_status_item_clicked(&mut self) {
        if self.settings.cycle_on_click_enabled {
            self.toggle_or_cycle_visibility();
        }
    }

    /// 在 (最后修改, 创建) 的四个显示组合间循环
    pub fn toggle_or_cycle_visibility(&mut self) {
        self.settings.cycle_enabled();
        tracing::info!(
            "显示状态切换为 最后修改={} 创建={}",
            self.settings.last_modified_enabled,
            self.settings.created_enabled
        );
        self.sync_slots();
        for kind in SlotKind::ALL {
            self.refresh_and_render(kind);
        }
        self.persist();
    }

    fn sync_slots(&mut self) {
        for slot in &mut self.slots {
            slot.apply_settings(&self.settings);
        }
    }

    /// 写入失败只记录日志，不影响显示
    fn persist(&mut self) {
        if let Err(e) = self.store.save_persisted(&self.settings) {
            tracing::warn!("保存设置失败: {}", e);
        }
    }

    /// 先取消旧定时器再创建新的，保证同时只有一个
    fn restart_timer(&mut self) {
        if let Some(handle) = self.timer_handle.take() {
            self.timer.cancel(handle);
        }
        let interval = self.settings.refresh_interval();
        self.timer_handle = Some(self.timer.schedule(interval));
        tracing::info!("刷新定时器已启动，间隔 {:?}", interval);
    }
}

impl Lifecycle for StampController {
    fn start(&mut self) {
        for kind in SlotKind::ALL {
            if self.settings.enabled(kind) {
                self.refresh_and_render(kind);
            }
        }
        self.restart_timer();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.timer_handle.take() {
            self.timer.cancel(handle);
        }
        for item in &mut self.items {
            item.hide();
        }
        tracing::info!("时间戳控制器已停止");
    }
}
