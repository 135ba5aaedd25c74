//! Native GUI viewer using egui
//!
//! The app controller owns the state and hands it to the panels and the 3D
//! scene each frame. Loading runs on the tokio runtime and reports back over
//! oneshot channels that are polled at the start of every frame.

use eframe::egui;
use std::future::Future;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::analysis::AnalysisDashboard;
use crate::config::Config;
use crate::loader::{LoadError, Loader};
use crate::model::Dataset;
use crate::render::Scene;
use crate::state::{AppState, View, ViewDefaults};
use crate::ui::{self, SidebarAction};

/// Run the native GUI viewer
pub fn run_viewer(config: Config, runtime: Handle) -> anyhow::Result<()> {
    let title = config.window.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(AtlasApp::new(cc, config, runtime)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

enum LoadState {
    Loading(oneshot::Receiver<Result<Dataset, LoadError>>),
    Ready,
    Failed(String),
}

struct AtlasApp {
    config: Config,
    runtime: Handle,
    state: AppState,
    load: LoadState,
    /// Built once the first dataset is in
    scene: Option<Scene>,
    dashboard: AnalysisDashboard,
    sidebar_open: bool,
}

impl AtlasApp {
    fn new(cc: &eframe::CreationContext<'_>, config: Config, runtime: Handle) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let mut app = Self::with_runtime(config, runtime);
        app.request_dataset(&cc.egui_ctx);
        app
    }

    fn with_runtime(config: Config, runtime: Handle) -> Self {
        let state = AppState::new(ViewDefaults::from(&config.defaults));
        Self {
            config,
            runtime,
            state,
            load: LoadState::Failed("Not loaded yet".to_string()),
            scene: None,
            dashboard: AnalysisDashboard::default(),
            sidebar_open: true,
        }
    }

    fn loader(&self) -> Result<Loader, LoadError> {
        Loader::from_base(&self.config.data.base)
    }

    /// Run `fut` on the runtime; the receiver yields its output
    fn spawn<T, F>(&self, ctx: &egui::Context, fut: F) -> oneshot::Receiver<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            if tx.send(fut.await).is_err() {
                warn!("Load finished but nobody is waiting for it");
            }
            ctx.request_repaint();
        });
        rx
    }

    /// Start (or restart) the explorer load
    fn request_dataset(&mut self, ctx: &egui::Context) {
        info!("Loading dataset from {}", self.config.data.base);
        let loader = self.loader();
        let rx = self.spawn(ctx, async move {
            match loader {
                Ok(loader) => loader.load_dataset().await,
                Err(e) => Err(e),
            }
        });
        self.load = LoadState::Loading(rx);
    }

    fn request_analysis(&mut self, ctx: &egui::Context) {
        let loader = self.loader();
        let rx = self.spawn(ctx, async move {
            match loader {
                Ok(loader) => loader.load_analysis().await,
                Err(e) => Err(e),
            }
        });
        self.dashboard.start_loading(rx);
    }

    fn poll_dataset(&mut self) {
        let LoadState::Loading(rx) = &mut self.load else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(dataset)) => {
                self.state.set_data(dataset);
                self.load = LoadState::Ready;
            }
            Ok(Err(e)) => {
                error!("Failed to load dataset: {}", e);
                self.load = LoadState::Failed(e.to_string());
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                error!("Dataset load task ended without a result");
                self.load = LoadState::Failed("Load task ended unexpectedly".to_string());
            }
        }
    }

    fn show_explorer(&mut self, ctx: &egui::Context) {
        match &self.load {
            LoadState::Loading(_) => {
                egui::CentralPanel::default().show(ctx, ui::loading_view);
                return;
            }
            LoadState::Failed(message) => {
                let message = message.clone();
                let retry = egui::CentralPanel::default()
                    .show(ctx, |ui| ui::error_view(ui, &message))
                    .inner;
                if retry {
                    self.request_dataset(ctx);
                }
                return;
            }
            LoadState::Ready => {}
        }

        let mut reload = false;
        if self.sidebar_open {
            egui::SidePanel::left("sidebar")
                .default_width(340.0)
                .min_width(260.0)
                .show(ctx, |ui| {
                    reload = ui::show_sidebar(ui, &mut self.state) == SidebarAction::Reload;
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let scene = self.scene.get_or_insert_with(|| Scene::new(&self.config));
                let rect = ui.max_rect();
                scene.show(ui, &mut self.state);
                ui::show_legend(ctx, rect, self.state.color_mode(), scene.scatter().domains());
            });

        if reload {
            self.request_dataset(ctx);
        }
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_dataset();
        self.dashboard.poll();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.state.view() == View::Explorer {
                    ui.toggle_value(&mut self.sidebar_open, "☰")
                        .on_hover_text("Show or hide the sidebar");
                }
                ui::show_view_toggle(ui, &mut self.state);
            });
        });

        match self.state.view() {
            View::Explorer => self.show_explorer(ctx),
            View::Analysis => {
                if self.dashboard.needs_load() {
                    self.request_analysis(ctx);
                }
                egui::CentralPanel::default().show(ctx, |ui| self.dashboard.show(ui, &self.state));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{PAPERS_FILE, TOPICS_FILE};
    use std::time::{Duration, Instant};

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join(PAPERS_FILE),
            r#"[{"id": "a", "title": "Graph Drawing", "journal": "X", "x": 0, "y": 0, "z": 0, "cluster": "0"},
                {"id": "b", "title": "Volume Rendering", "journal": "Y", "x": 1, "y": 0, "z": 0, "cluster": "1"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(TOPICS_FILE),
            r#"[{"id": "0", "keywords": [], "position": [0, 0, 0]}, {"id": "1", "keywords": [], "position": [1, 0, 0]}]"#,
        )
        .unwrap();
        dir
    }

    fn app_for(base: &str, rt: &tokio::runtime::Runtime) -> AtlasApp {
        let mut config = Config::default();
        config.data.base = base.to_string();
        AtlasApp::with_runtime(config, rt.handle().clone())
    }

    fn wait_for_load(app: &mut AtlasApp) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while matches!(app.load, LoadState::Loading(_)) && Instant::now() < deadline {
            app.poll_dataset();
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_load_then_reload_clears_selection() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = fixture();
        let ctx = egui::Context::default();
        let mut app = app_for(&dir.path().display().to_string(), &rt);

        app.request_dataset(&ctx);
        wait_for_load(&mut app);
        assert!(matches!(app.load, LoadState::Ready));
        assert_eq!(app.state.papers().len(), 2);
        assert!(app.state.global().is_none());

        app.state.select(Some(1));
        app.request_dataset(&ctx);
        wait_for_load(&mut app);
        assert!(matches!(app.load, LoadState::Ready));
        assert!(app.state.selected_paper().is_none());
    }

    #[test]
    fn test_missing_required_file_fails_with_message() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut app = app_for(&dir.path().display().to_string(), &rt);

        app.request_dataset(&ctx);
        wait_for_load(&mut app);
        match &app.load {
            LoadState::Failed(message) => assert!(message.contains("papers.json")),
            _ => panic!("expected a failed load"),
        }
        assert!(app.state.papers().is_empty());
    }

    #[test]
    fn test_invalid_base_fails_without_panicking() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let ctx = egui::Context::default();
        let mut app = app_for("ftp://example.org", &rt);
        app.request_dataset(&ctx);
        wait_for_load(&mut app);
        assert!(matches!(app.load, LoadState::Failed(_)));
    }
}
