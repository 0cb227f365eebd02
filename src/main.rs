//! 程序入口：初始化日志、加载 Slint UI，把宿主接口绑定到时间戳控制器

use std::{
    cell::{OnceCell, RefCell},
    collections::HashMap,
    path::{Path, PathBuf},
    rc::{Rc, Weak},
    time::Duration,
};

use anyhow::Context;
use slint::{ComponentHandle, Timer, TimerMode};
use tracing_subscriber::fmt::SubscriberBuilder;

use shijianchuo_lan::model::slot::SlotKind;
use shijianchuo_lan::utils::fs::{ActiveFile, JsonFileStore};
use shijianchuo_lan::utils::watch::NoteWatcher;
use shijianchuo_lan::vm::bridge::*;
use shijianchuo_lan::{
    ConfigurableUi, HostBindings, Lifecycle, MomentFormatter, Settings, StampController,
    StatusItem, TimerDriver, TimerHandle,
};

slint::include_modules!();

/// 状态栏元素：写入窗口上对应槽位的属性
struct SlintStatusItem {
    window: slint::Weak<AppWindow>,
    kind: SlotKind,
}

impl StatusItem for SlintStatusItem {
    fn set_text(&mut self, text: &str) {
        if let Some(w) = self.window.upgrade() {
            match self.kind {
                SlotKind::LastModified => w.set_last_modified_text(text.into()),
                SlotKind::Created => w.set_created_text(text.into()),
            }
        }
    }

    fn show(&mut self) {
        self.set_visible(true);
    }

    fn hide(&mut self) {
        self.set_visible(false);
    }

    fn set_clickable(&mut self, clickable: bool) {
        if let Some(w) = self.window.upgrade() {
            match self.kind {
                SlotKind::LastModified => w.set_last_modified_clickable(clickable),
                SlotKind::Created => w.set_created_clickable(clickable),
            }
        }
    }
}

impl SlintStatusItem {
    fn set_visible(&self, visible: bool) {
        if let Some(w) = self.window.upgrade() {
            match self.kind {
                SlotKind::LastModified => w.set_last_modified_visible(visible),
                SlotKind::Created => w.set_created_visible(visible),
            }
        }
    }
}

type ControllerCell = Rc<OnceCell<Weak<RefCell<StampController>>>>;

/// 基于 slint::Timer 的定时器；Timer 被丢弃时自动停止
struct SlintTimerDriver {
    timers: HashMap<u64, Timer>,
    next_id: u64,
    controller: ControllerCell,
}

impl SlintTimerDriver {
    fn new(controller: ControllerCell) -> Self {
        Self {
            timers: HashMap::new(),
            next_id: 0,
            controller,
        }
    }
}

impl TimerDriver for SlintTimerDriver {
    fn schedule(&mut self, interval: Duration) -> TimerHandle {
        self.next_id += 1;
        let controller = self.controller.clone();
        let timer = Timer::default();
        timer.start(TimerMode::Repeated, interval, move || {
            let Some(controller) = controller.get().and_then(Weak::upgrade) else {
                return;
            };
            // 控制器正在处理其他事件时跳过本次轮询
            if let Ok(mut controller) = controller.try_borrow_mut() {
                controller.on_timer_tick();
            };
        });
        self.timers.insert(self.next_id, timer);
        TimerHandle(self.next_id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.timers.remove(&handle.0) {
            timer.stop();
        }
    }
}

/// 设置面板：把设置写回控件
struct SlintSettingsPanel {
    window: slint::Weak<AppWindow>,
}

impl ConfigurableUi for SlintSettingsPanel {
    fn render_settings(&mut self, settings: &Settings) {
        let Some(w) = self.window.upgrade() else {
            return;
        };
        w.set_last_modified_enabled(settings.last_modified_enabled);
        w.set_last_modified_format(settings.last_modified_timestamp_format.as_str().into());
        w.set_last_modified_prepend(settings.last_modified_prepend.as_str().into());
        w.set_created_enabled(settings.created_enabled);
        w.set_created_format(settings.created_timestamp_format.as_str().into());
        w.set_created_prepend(settings.created_prepend.as_str().into());
        w.set_cycle_on_click(settings.cycle_on_click_enabled);
        w.set_refresh_interval(refresh_interval_text(settings).into());
    }
}

/// VM桥接器：管理UI与控制器的交互
struct ViewModelBridge {
    controller: Rc<RefCell<StampController>>,
    active_file: ActiveFile,
    /// 当前笔记的文件监听；切换或关闭笔记时替换
    watcher: Rc<RefCell<Option<NoteWatcher>>>,
    panel: Rc<RefCell<SlintSettingsPanel>>,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(
        app_window: &AppWindow,
        controller: Rc<RefCell<StampController>>,
        active_file: ActiveFile,
    ) -> Self {
        let bridge = Self {
            controller,
            active_file,
            watcher: Rc::new(RefCell::new(None)),
            panel: Rc::new(RefCell::new(SlintSettingsPanel {
                window: app_window.as_weak(),
            })),
        };

        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        // === 打开笔记 ===
        {
            let controller = self.controller.clone();
            let active_file = self.active_file.clone();
            let watcher = self.watcher.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_open_document(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_open_document(&app_window, &controller, &active_file, &watcher);
                }
            });
        }

        // === 关闭笔记 ===
        {
            let controller = self.controller.clone();
            let active_file = self.active_file.clone();
            let watcher = self.watcher.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_close_document(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    watcher.borrow_mut().take();
                    active_file.set(None);
                    app_window.set_current_path("".into());
                    app_window.set_status_message(STATUS_DOCUMENT_CLOSED.into());
                    controller.borrow_mut().on_active_document_changed();
                    tracing::info!("笔记已关闭");
                }
            });
        }

        // === 笔记文件被修改（来自监听线程，经事件循环转发） ===
        {
            let controller = self.controller.clone();
            app_window.on_document_modified(move |path| {
                controller
                    .borrow_mut()
                    .on_document_modified(Path::new(path.as_str()));
            });
        }

        // === 状态栏点击 ===
        {
            let controller = self.controller.clone();
            let panel = self.panel.clone();
            app_window.on_status_item_clicked(move || {
                let mut controller = controller.borrow_mut();
                controller.on_status_item_clicked();
                // 循环会改变显示开关，同步到面板
                panel.borrow_mut().render_settings(controller.settings());
            });
        }

        // === 复选框 ===
        {
            let controller = self.controller.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_setting_toggled(move |key, checked| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    let result = setting_change_from_toggle(key.as_str(), checked);
                    Self::apply_setting_change(&app_window, &controller, result);
                }
            });
        }

        // === 文本框 ===
        {
            let controller = self.controller.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_setting_edited(move |key, value| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    let result = setting_change_from_edit(key.as_str(), value.as_str());
                    Self::apply_setting_change(&app_window, &controller, result);
                }
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_status_message(STATUS_NO_DOCUMENT.into());
        app_window.set_current_path("".into());
        self.panel
            .borrow_mut()
            .render_settings(self.controller.borrow().settings());
    }

    /// 显示文件选择对话框
    fn show_file_dialog() -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter("Markdown笔记", &["md", "markdown", "txt"])
            .add_filter("所有文件", &["*"])
            .set_title("选择要查看的笔记")
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了笔记: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    /// 处理打开笔记操作
    fn handle_open_document(
        app_window: &AppWindow,
        controller: &Rc<RefCell<StampController>>,
        active_file: &ActiveFile,
        watcher: &Rc<RefCell<Option<NoteWatcher>>>,
    ) {
        let Some(path) = Self::show_file_dialog() else {
            return;
        };

        app_window.set_current_path(path.to_string_lossy().to_string().into());
        *watcher.borrow_mut() = Self::watch_note(app_window, &path);
        active_file.set(Some(path));
        controller.borrow_mut().on_active_document_changed();
        app_window.set_status_message(STATUS_DOCUMENT_OPENED.into());
    }

    /// 监听笔记文件，把修改事件转发到 UI 线程
    fn watch_note(app_window: &AppWindow, path: &Path) -> Option<NoteWatcher> {
        let app_window_weak = app_window.as_weak();
        let result = NoteWatcher::watch(path, move |note| {
            let app_window_weak = app_window_weak.clone();
            let note = note.to_string_lossy().to_string();
            let _ = slint::invoke_from_event_loop(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    app_window.invoke_document_modified(note.into());
                }
            });
        });
        match result {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                // 监听不可用时仍有定时轮询兜底
                tracing::warn!("无法监听笔记 {}: {}", path.display(), e);
                None
            }
        }
    }

    /// 应用设置修改；输入无效时只提示，不修改设置
    fn apply_setting_change(
        app_window: &AppWindow,
        controller: &Rc<RefCell<StampController>>,
        result: Result<shijianchuo_lan::SettingChange, shijianchuo_lan::AppError>,
    ) {
        match result {
            Ok(change) => {
                controller.borrow_mut().on_settings_changed(change);
                app_window.set_status_message(STATUS_SETTINGS_SAVED.into());
            }
            Err(e) => {
                let error_msg = format!("{}{}", STATUS_ERROR_PREFIX, e);
                app_window.set_status_message(error_msg.into());
                tracing::warn!("设置修改被拒绝: {}", e);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let app = AppWindow::new().context("UI 初始化失败")?;

    let data_path = std::env::var(DATA_FILE_ENV).unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string());
    let store = JsonFileStore::new(data_path);
    tracing::info!("设置文件: {}", store.path().display());

    let active_file = ActiveFile::default();
    let controller_cell: ControllerCell = Rc::new(OnceCell::new());
    let host = HostBindings {
        documents: Box::new(active_file.clone()),
        formatter: Box::new(MomentFormatter::local()),
        last_modified_item: Box::new(SlintStatusItem {
            window: app.as_weak(),
            kind: SlotKind::LastModified,
        }),
        created_item: Box::new(SlintStatusItem {
            window: app.as_weak(),
            kind: SlotKind::Created,
        }),
        store: Box::new(store),
        timer: Box::new(SlintTimerDriver::new(controller_cell.clone())),
    };
    let controller = Rc::new(RefCell::new(StampController::load(host)));
    let _ = controller_cell.set(Rc::downgrade(&controller));

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, controller.clone(), active_file);
    bridge.initialize_ui(&app);

    controller.borrow_mut().start();
    tracing::info!("应用启动成功，UI已初始化");

    let run_result = app.run();
    controller.borrow_mut().stop();
    run_result.context("事件循环异常退出")?;
    Ok(())
}
